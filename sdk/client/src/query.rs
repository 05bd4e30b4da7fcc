//! Two-phase statistics query.
//!
//! `compute_stats` has to be submitted as a transaction because it hands out
//! decrypt rights. The transaction's return value is held back until the
//! transaction is confirmed and is released by [`StatsQuery::read`] without
//! touching the ledger again. [`StatsQuery`] tracks where such a query is.

use common::AggregateResult;
use soroban_sdk::Address;
use tracing::{debug, instrument};

use crate::error::{ClientError, Result};
use crate::session::SessionGuard;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryState {
    Submitted,
    Confirmed,
    Readable(AggregateResult),
    Cancelled,
}

impl QueryState {
    fn name(&self) -> &'static str {
        match self {
            QueryState::Submitted => "Submitted",
            QueryState::Confirmed => "Confirmed",
            QueryState::Readable(_) => "Readable",
            QueryState::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug)]
pub struct StatsQuery {
    viewer: Address,
    owner: Address,
    start_time: u64,
    end_time: u64,
    guard: SessionGuard,
    pending: Option<AggregateResult>,
    state: QueryState,
}

impl StatsQuery {
    pub(crate) fn submitted(
        viewer: Address,
        owner: Address,
        start_time: u64,
        end_time: u64,
        guard: SessionGuard,
        result: AggregateResult,
    ) -> Self {
        Self {
            viewer,
            owner,
            start_time,
            end_time,
            guard,
            pending: Some(result),
            state: QueryState::Submitted,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn window(&self) -> (u64, u64) {
        (self.start_time, self.end_time)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.state = QueryState::Cancelled;
    }

    fn ensure_fresh(&mut self) -> Result<()> {
        if let Err(err) = self.guard.check() {
            self.cancel();
            return Err(err);
        }
        Ok(())
    }

    /// Marks the submitted transaction as confirmed.
    pub fn confirm(&mut self) -> Result<()> {
        if self.state != QueryState::Submitted {
            return Err(ClientError::InvalidState {
                expected: "Submitted",
                found: self.state.name(),
            });
        }
        self.ensure_fresh()?;
        self.state = QueryState::Confirmed;
        Ok(())
    }

    /// Releases the result of a confirmed query. Later calls return the
    /// result already read. Nothing is sent to the ledger.
    #[instrument(skip(self), fields(owner = ?self.owner, viewer = ?self.viewer))]
    pub fn read(&mut self) -> Result<AggregateResult> {
        match &self.state {
            QueryState::Readable(result) => return Ok(result.clone()),
            QueryState::Confirmed => {}
            other => {
                return Err(ClientError::InvalidState {
                    expected: "Confirmed",
                    found: other.name(),
                })
            }
        }
        self.ensure_fresh()?;

        let result = self.pending.take().ok_or(ClientError::InvalidState {
            expected: "Confirmed",
            found: "Readable",
        })?;
        debug!(record_count = result.record_count, "stats readable");
        self.state = QueryState::Readable(result.clone());
        Ok(result)
    }
}

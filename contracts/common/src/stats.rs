use soroban_sdk::{contracttype, Env};

use crate::handle::{is_zero, zero_handle, Handle};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Aggregate statistics over one owner's records in one time window.
///
/// Never persisted by the ledger: it is derived on every query. Every handle
/// is either the zero handle (empty window) or freshly derived by the fold.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateResult {
    pub total: Handle,
    pub average: Handle,
    pub max: Handle,
    pub best_record: Handle,
    /// Number of records in the window. Public ledger metadata.
    pub record_count: u32,
}

impl AggregateResult {
    pub fn empty(env: &Env) -> Self {
        Self {
            total: zero_handle(env),
            average: zero_handle(env),
            max: zero_handle(env),
            best_record: zero_handle(env),
            record_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        is_zero(&self.total)
            && is_zero(&self.average)
            && is_zero(&self.max)
            && is_zero(&self.best_record)
    }
}

/// Handles produced by folding a list of encrypted minute counts in one
/// coprocessor call. All zero when the list is empty.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FoldedStats {
    pub total: Handle,
    pub max: Handle,
    pub average: Handle,
}

impl FoldedStats {
    pub fn empty(env: &Env) -> Self {
        Self {
            total: zero_handle(env),
            max: zero_handle(env),
            average: zero_handle(env),
        }
    }
}

/// Query periods offered to users.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatsPeriod {
    Week,
    Month,
    Year,
    AllTime,
}

impl StatsPeriod {
    pub fn span_seconds(&self) -> Option<u64> {
        match self {
            StatsPeriod::Week => Some(7 * SECONDS_PER_DAY),
            StatsPeriod::Month => Some(30 * SECONDS_PER_DAY),
            StatsPeriod::Year => Some(365 * SECONDS_PER_DAY),
            StatsPeriod::AllTime => None,
        }
    }

    /// Half-open `[start, end)` window ending just after `now`, so records
    /// stamped in the current ledger are included.
    pub fn window(&self, now: u64) -> (u64, u64) {
        match self.span_seconds() {
            Some(span) => (now.saturating_sub(span), now.saturating_add(1)),
            None => (0, u64::MAX),
        }
    }
}

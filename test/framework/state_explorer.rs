//! # State Space Explorer
//!
//! Executes ledger action sequences and verifies invariants after every
//! transition.
//!
//! ## Design
//!
//! Each explored state is a `LedgerSnapshot`; edges are `LedgerAction`s.
//! Besides the state invariants, every edge is checked against the
//! transition invariants that apply to its action: appends must add exactly
//! one record, queries and rejected mutations must leave state untouched.
//!
//! ## Complexity
//!
//! - Time: O(S × (I + U²)) where S = executed steps, I = invariants and
//!   U = tracked users (grant snapshots are pairwise). Bounded by `max_steps`.
//! - Space: O(S × U) when snapshots are recorded, O(U) otherwise.

extern crate std;

use common::StatsPeriod;
use soroban_sdk::Address;
use std::string::String;
use std::vec::Vec;

use super::generators::LedgerAction;
use super::invariants::{
    AppendOnly, InvariantSet, MonotonicTime, ReadOnly, SingleAppend, TransitionInvariantSet,
};
use super::{ActionOutcome, LedgerSnapshot, LedgerTestHarness, TestRunSummary};

// ── Explorer Configuration ───────────────────────────────────────────────────

/// Configuration for state-space exploration.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Maximum number of actions to execute in a single exploration run.
    pub max_steps: usize,
    /// Whether to halt on the first invariant violation (fail-fast).
    pub fail_fast: bool,
    /// Whether to record snapshots for later analysis.
    pub record_snapshots: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            fail_fast: true,
            record_snapshots: false,
        }
    }
}

// ── Exploration Result ───────────────────────────────────────────────────────

/// Full result of an exploration run.
#[derive(Debug)]
pub struct ExplorationResult {
    pub summary: TestRunSummary,
    pub snapshots: Vec<LedgerSnapshot>,
    pub action_log: Vec<(LedgerAction, ActionOutcome)>,
}

impl ExplorationResult {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }

    /// Number of logged actions that ended in a contract error.
    pub fn rejected_actions(&self) -> usize {
        self.action_log
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ActionOutcome::ExpectedError(_)))
            .count()
    }
}

// ── State Space Explorer ─────────────────────────────────────────────────────

/// Executes action sequences against the ledger, checking invariants after
/// every transition.
///
/// Tracks coverage metrics including entry points hit and transitions observed.
pub struct StateExplorer<'a> {
    harness: &'a LedgerTestHarness<'a>,
    invariants: InvariantSet,
    config: ExplorerConfig,
    users: Vec<Address>,
}

impl<'a> StateExplorer<'a> {
    /// Create an explorer for the given harness and user pool.
    pub fn new(
        harness: &'a LedgerTestHarness<'a>,
        invariants: InvariantSet,
        config: ExplorerConfig,
        users: Vec<Address>,
    ) -> Self {
        Self {
            harness,
            invariants,
            config,
            users,
        }
    }

    /// Create an explorer with default configuration and built-in invariants.
    pub fn with_defaults(harness: &'a LedgerTestHarness<'a>, users: Vec<Address>) -> Self {
        Self::new(
            harness,
            InvariantSet::ledger_defaults(),
            ExplorerConfig::default(),
            users,
        )
    }

    /// Execute a sequence of actions, checking invariants after each.
    ///
    /// Returns an `ExplorationResult` with full coverage metrics.
    pub fn explore(&mut self, actions: &[LedgerAction]) -> ExplorationResult {
        let mut summary = TestRunSummary::new();
        let mut snapshots = Vec::new();
        let mut action_log = Vec::new();

        let mut before = self.harness.snapshot(&self.users);
        if self.config.record_snapshots {
            snapshots.push(before.clone());
        }

        let steps = actions.len().min(self.config.max_steps);

        for action in actions.iter().take(steps) {
            let outcome = self.execute_action(action);
            summary.entry_points_hit.insert(action_entry_point(action));
            summary.actions_executed += 1;
            summary.transitions_observed += 1;

            let after = self.harness.snapshot(&self.users);
            let mut violations = self.invariants.check_all(&after);
            violations.extend(
                self.transition_checks(action, &outcome)
                    .check_all(&before, &after),
            );
            if let Err(msg) = MonotonicTime::check_transition(&before, &after) {
                violations.push((String::from("monotonic time"), msg));
            }
            if let ActionOutcome::UnexpectedError(msg) = &outcome {
                violations.push((String::from("no host errors"), msg.clone()));
            }
            summary.invariant_checks += 1;

            action_log.push((action.clone(), outcome));

            let failed = !violations.is_empty();
            for (name, msg) in violations {
                summary.invariant_violations.push(std::format!(
                    "After action #{} ({:?}): [{}] {}",
                    summary.actions_executed,
                    action,
                    name,
                    msg
                ));
            }

            if self.config.record_snapshots {
                snapshots.push(after.clone());
            }
            if failed && self.config.fail_fast {
                break;
            }
            before = after;
        }

        ExplorationResult {
            summary,
            snapshots,
            action_log,
        }
    }

    fn user(&self, index: usize) -> &Address {
        &self.users[index % self.users.len()]
    }

    /// Transition invariants that apply to `action` given how it ended.
    fn transition_checks(&self, action: &LedgerAction, outcome: &ActionOutcome) -> TransitionInvariantSet {
        let mut set = TransitionInvariantSet::new();
        set.add(Box::new(AppendOnly));
        let succeeded = matches!(outcome, ActionOutcome::Ok);
        match action {
            LedgerAction::Append { user_index, .. } | LedgerAction::ForgedAppend { user_index, .. }
                if succeeded =>
            {
                set.add(Box::new(SingleAppend {
                    owner: self.user(*user_index).clone(),
                }));
            }
            LedgerAction::Grant { .. }
            | LedgerAction::Revoke { .. }
            | LedgerAction::ForeignGrant { .. }
                if succeeded => {}
            LedgerAction::AdvanceTime { .. } => {}
            _ => set.add(Box::new(ReadOnly)),
        }
        set
    }

    /// Execute a single action against the harness, returning the outcome.
    fn execute_action(&self, action: &LedgerAction) -> ActionOutcome {
        let ledger = &self.harness.ledger;
        match action {
            LedgerAction::Append { user_index, minutes } => {
                match self.harness.try_append(self.user(*user_index), *minutes) {
                    Ok(_) => ActionOutcome::Ok,
                    Err(e) => ActionOutcome::ExpectedError(e as u32),
                }
            }
            LedgerAction::ForgedAppend {
                user_index,
                victim_index,
                minutes,
            } => {
                let input = self.harness.coprocessor.encrypt_input(
                    self.user(*victim_index),
                    &ledger.address,
                    minutes,
                );
                outcome(ledger.try_add_offline_record(
                    self.user(*user_index),
                    &input.handle,
                    &input.proof,
                ))
            }
            LedgerAction::Grant {
                owner_index,
                viewer_index,
            } => {
                let owner = self.user(*owner_index);
                outcome(ledger.try_grant_access(owner, owner, self.user(*viewer_index)))
            }
            LedgerAction::Revoke {
                owner_index,
                viewer_index,
            } => {
                let owner = self.user(*owner_index);
                outcome(ledger.try_revoke_access(owner, owner, self.user(*viewer_index)))
            }
            LedgerAction::ForeignGrant {
                caller_index,
                owner_index,
                viewer_index,
            } => outcome(ledger.try_grant_access(
                self.user(*caller_index),
                self.user(*owner_index),
                self.user(*viewer_index),
            )),
            LedgerAction::ComputeStats {
                viewer_index,
                owner_index,
                period,
            } => {
                let (start, end) = period.window(self.harness.env.timestamp());
                outcome(ledger.try_compute_stats(
                    self.user(*viewer_index),
                    self.user(*owner_index),
                    &start,
                    &end,
                ))
            }
            LedgerAction::ReadRecord { owner_index, index } => {
                outcome(ledger.try_get_record(self.user(*owner_index), index))
            }
            LedgerAction::AdvanceTime { delta } => {
                self.harness.env.advance_time(*delta);
                ActionOutcome::Ok
            }
        }
    }
}

fn outcome<T, C, E, H>(result: Result<Result<T, C>, Result<E, H>>) -> ActionOutcome
where
    E: Into<soroban_sdk::Error>,
    H: core::fmt::Debug,
{
    match result {
        Ok(_) => ActionOutcome::Ok,
        Err(Ok(e)) => ActionOutcome::ExpectedError(e.into().get_code()),
        Err(Err(e)) => ActionOutcome::UnexpectedError(std::format!("{:?}", e)),
    }
}

/// Map a ledger action to its entry point name for coverage tracking.
fn action_entry_point(action: &LedgerAction) -> String {
    match action {
        LedgerAction::Append { .. } | LedgerAction::ForgedAppend { .. } => {
            "add_offline_record".into()
        }
        LedgerAction::Grant { .. } | LedgerAction::ForeignGrant { .. } => "grant_access".into(),
        LedgerAction::Revoke { .. } => "revoke_access".into(),
        LedgerAction::ComputeStats { .. } => "compute_stats".into(),
        LedgerAction::ReadRecord { .. } => "get_record".into(),
        LedgerAction::AdvanceTime { .. } => "advance_time".into(),
    }
}

/// The ledger entry points reachable from `LedgerAction`s, for coverage
/// calculation.
pub const LEDGER_ENTRY_POINTS: &[&str] = &[
    "add_offline_record",
    "grant_access",
    "revoke_access",
    "compute_stats",
    "get_record",
];

/// Actions touching every ledger entry point once, used to seed explorations.
pub fn coverage_seed(num_users: usize) -> Vec<LedgerAction> {
    let other = 1 % num_users.max(1);
    std::vec![
        LedgerAction::Append { user_index: 0, minutes: 60 },
        LedgerAction::Grant { owner_index: 0, viewer_index: other },
        LedgerAction::ComputeStats { viewer_index: other, owner_index: 0, period: StatsPeriod::Week },
        LedgerAction::ReadRecord { owner_index: 0, index: 0 },
        LedgerAction::Revoke { owner_index: 0, viewer_index: other },
    ]
}

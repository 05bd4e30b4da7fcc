//! Encrypted statistics over one owner's records.
//!
//! The fold runs entirely on handles: the ledger never sees a plaintext
//! minute value. Only the number of records in the window is in the clear,
//! and that is already public from the record timestamps.

use soroban_sdk::{Address, Env};

use common::{is_zero, AggregateResult, CoprocessorClient, Handle};

use crate::ledger;

/// Folds every record of `owner` with `start_time <= timestamp < end_time`
/// in a single coprocessor call.
///
/// An empty window yields [`AggregateResult::empty`] without calling the
/// coprocessor. `best_record` is the maximum single record, which is the same
/// handle as `max`.
pub fn fold(
    env: &Env,
    coprocessor: &CoprocessorClient,
    owner: &Address,
    start_time: u64,
    end_time: u64,
) -> AggregateResult {
    let count = ledger::record_count(env, owner);
    let minutes = ledger::minutes_in_window(env, owner, count, start_time, end_time);
    if minutes.is_empty() {
        return AggregateResult::empty(env);
    }

    let folded = coprocessor.fold_stats(&env.current_contract_address(), &minutes);
    AggregateResult {
        total: folded.total,
        average: folded.average,
        best_record: folded.max.clone(),
        max: folded.max,
        record_count: minutes.len(),
    }
}

/// Lets `viewer` decrypt every non-zero handle of `result`. `best_record`
/// shares its handle with `max`.
pub fn share_with(
    env: &Env,
    coprocessor: &CoprocessorClient,
    result: &AggregateResult,
    viewer: &Address,
) {
    let this = env.current_contract_address();
    let handles: [&Handle; 3] = [&result.total, &result.average, &result.max];
    for handle in handles {
        if !is_zero(handle) {
            coprocessor.allow(&this, handle, viewer);
        }
    }
}

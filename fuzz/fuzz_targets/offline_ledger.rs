#![no_main]

use arbitrary::Arbitrary;
use coprocessor::{CoprocessorContract, CoprocessorContractClient};
use libfuzzer_sys::fuzz_target;
use offline_ledger::{ContractError, OfflineLedgerContract, OfflineLedgerContractClient};
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    Address, Env,
};

/// Actions modelling every ledger entry point.
///
/// Indices select from a small user pool. Times are bounded so windows stay
/// meaningful.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Append { user: u8, minutes: u16 },
    ForgedAppend { user: u8, victim: u8, minutes: u16 },
    Grant { caller: u8, owner: u8, viewer: u8 },
    Revoke { caller: u8, owner: u8, viewer: u8 },
    ComputeStats { viewer: u8, owner: u8, start: u32, len: u32 },
    ReadRecord { owner: u8, index: u8 },
    AdvanceTime { delta: u16 },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_700_000_000);

    let coprocessor_id = env.register(CoprocessorContract, ());
    let coprocessor = CoprocessorContractClient::new(&env, &coprocessor_id);
    let ledger_id = env.register(OfflineLedgerContract, ());
    let ledger = OfflineLedgerContractClient::new(&env, &ledger_id);
    if ledger
        .try_initialize(&Address::generate(&env), &coprocessor_id)
        .is_err()
    {
        return;
    }

    let users: Vec<Address> = (0..4).map(|_| Address::generate(&env)).collect();
    let pick = |i: u8| &users[i as usize % users.len()];

    // Model: (timestamp) per accepted record, per user.
    let mut model: Vec<Vec<u64>> = vec![Vec::new(); users.len()];
    let mut grants: Vec<(usize, usize)> = Vec::new();

    for action in actions.into_iter().take(64) {
        match action {
            FuzzAction::Append { user, minutes } => {
                let owner = pick(user);
                let input = coprocessor.encrypt_input(owner, &ledger_id, &u64::from(minutes));
                let index = ledger.add_offline_record(owner, &input.handle, &input.proof);
                let records = &mut model[user as usize % users.len()];
                assert_eq!(index as usize, records.len(), "INVARIANT VIOLATION: index not dense");
                records.push(env.ledger().timestamp());
            }
            FuzzAction::ForgedAppend { user, victim, minutes } => {
                let (u, v) = (user as usize % users.len(), victim as usize % users.len());
                let input = coprocessor.encrypt_input(pick(victim), &ledger_id, &u64::from(minutes));
                let result = ledger.try_add_offline_record(pick(user), &input.handle, &input.proof);
                if u == v {
                    assert!(result.is_ok());
                    model[u].push(env.ledger().timestamp());
                } else {
                    assert_eq!(
                        result,
                        Err(Ok(ContractError::InvalidProof)),
                        "INVARIANT VIOLATION: foreign proof accepted"
                    );
                }
            }
            FuzzAction::Grant { caller, owner, viewer } => {
                let result = ledger.try_grant_access(pick(caller), pick(owner), pick(viewer));
                let (c, o, v) = (
                    caller as usize % users.len(),
                    owner as usize % users.len(),
                    viewer as usize % users.len(),
                );
                if c != o {
                    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));
                } else if o != v && !grants.contains(&(o, v)) {
                    grants.push((o, v));
                }
            }
            FuzzAction::Revoke { caller, owner, viewer } => {
                let result = ledger.try_revoke_access(pick(caller), pick(owner), pick(viewer));
                let (c, o, v) = (
                    caller as usize % users.len(),
                    owner as usize % users.len(),
                    viewer as usize % users.len(),
                );
                if c != o {
                    assert_eq!(result, Err(Ok(ContractError::Unauthorized)));
                } else {
                    grants.retain(|g| *g != (o, v));
                }
            }
            FuzzAction::ComputeStats { viewer, owner, start, len } => {
                let (o, v) = (owner as usize % users.len(), viewer as usize % users.len());
                let start = 1_700_000_000u64.saturating_add(u64::from(start));
                let end = start.saturating_add(u64::from(len));
                let result = ledger.try_compute_stats(pick(viewer), pick(owner), &start, &end);
                if o == v || grants.contains(&(o, v)) {
                    let stats = result
                        .expect("INVARIANT VIOLATION: permitted query failed")
                        .expect("conversion");
                    let expected = model[o].iter().filter(|t| **t >= start && **t < end).count();
                    assert_eq!(stats.record_count as usize, expected, "INVARIANT VIOLATION: window count");
                    assert_eq!(stats.is_empty(), expected == 0);
                } else {
                    assert_eq!(result, Err(Ok(ContractError::AccessDenied)));
                }
            }
            FuzzAction::ReadRecord { owner, index } => {
                let o = owner as usize % users.len();
                let result = ledger.try_get_record(pick(owner), &u32::from(index));
                match model[o].get(index as usize) {
                    Some(ts) => assert_eq!(result.expect("read").expect("conversion").timestamp, *ts),
                    None => assert_eq!(result, Err(Ok(ContractError::IndexOutOfRange))),
                }
            }
            FuzzAction::AdvanceTime { delta } => {
                let ts = env.ledger().timestamp().saturating_add(u64::from(delta));
                env.ledger().set_timestamp(ts);
            }
        }

        // ── Post-action invariant checks ──
        for (i, user) in users.iter().enumerate() {
            assert_eq!(
                ledger.get_record_count(user) as usize,
                model[i].len(),
                "INVARIANT VIOLATION: record count drifted"
            );
            assert!(ledger.check_access_permission(user, user));
        }
    }
});

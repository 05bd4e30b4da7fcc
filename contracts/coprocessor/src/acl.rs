//! Per-handle access lists.
//!
//! The list lives inside the handle's [`Ciphertext`] entry, so checking a
//! right costs no storage read beyond loading the value itself.
//!
//! [`Ciphertext`]: crate::Ciphertext

use soroban_sdk::{Address, Env};

use common::{is_zero, Handle};

use crate::{events, values, CoprocessorError, DataKey};

const ACL_TTL_THRESHOLD: u32 = 518_400; // ~30 days (@ ~5s/ledger)
const ACL_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days (@ ~5s/ledger)

pub fn extend_entry_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, ACL_TTL_THRESHOLD, ACL_TTL_EXTEND_TO);
}

pub fn is_allowed(env: &Env, handle: &Handle, account: &Address) -> bool {
    values::load_entry(env, handle)
        .map(|entry| entry.allowed.contains(account))
        .unwrap_or(false)
}

/// Adds `account` to the handle's list. Returns `false` when it was already
/// there or the handle holds no value.
pub fn grant(env: &Env, handle: &Handle, account: &Address) -> bool {
    let Some(mut entry) = values::load_entry(env, handle) else {
        return false;
    };
    if entry.allowed.contains(account) {
        return false;
    }
    entry.allowed.push_back(account.clone());
    values::save_entry(env, handle, &entry);
    true
}

/// `caller` hands `account` the right to use and decrypt `handle`.
pub fn allow_from(
    env: &Env,
    caller: &Address,
    handle: &Handle,
    account: &Address,
) -> Result<(), CoprocessorError> {
    if is_zero(handle) {
        return Err(CoprocessorError::HandleNotFound);
    }
    let entry = values::load_entry(env, handle).ok_or(CoprocessorError::HandleNotFound)?;
    if !entry.allowed.contains(caller) {
        return Err(CoprocessorError::HandleNotAllowed);
    }
    if grant(env, handle, account) {
        events::publish_allowed(env, handle.clone(), caller.clone(), account.clone());
    }
    Ok(())
}

use soroban_sdk::{symbol_short, Address, Env, Symbol};

const GRANT: Symbol = symbol_short!("GRANT");
const GRANT_TTL_THRESHOLD: u32 = 5_184_000; // ~300 days (@ ~5s/ledger)
const GRANT_TTL_EXTEND_TO: u32 = 10_368_000; // ~600 days (@ ~5s/ledger)

fn grant_key(owner: &Address, viewer: &Address) -> (Symbol, Address, Address) {
    (GRANT, owner.clone(), viewer.clone())
}

/// Records that `viewer` may aggregate over `owner`'s ledger. Returns `false`
/// when nothing changed.
pub fn grant(env: &Env, owner: &Address, viewer: &Address) -> bool {
    if owner == viewer || is_granted(env, owner, viewer) {
        return false;
    }
    let key = grant_key(owner, viewer);
    env.storage().persistent().set(&key, &true);
    env.storage()
        .persistent()
        .extend_ttl(&key, GRANT_TTL_THRESHOLD, GRANT_TTL_EXTEND_TO);
    true
}

/// Removes a grant. Returns `false` when there was none.
pub fn revoke(env: &Env, owner: &Address, viewer: &Address) -> bool {
    if !is_granted(env, owner, viewer) {
        return false;
    }
    env.storage().persistent().remove(&grant_key(owner, viewer));
    true
}

fn is_granted(env: &Env, owner: &Address, viewer: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&grant_key(owner, viewer))
        .unwrap_or(false)
}

/// The owner always has access to their own data.
pub fn has_access(env: &Env, owner: &Address, viewer: &Address) -> bool {
    owner == viewer || is_granted(env, owner, viewer)
}

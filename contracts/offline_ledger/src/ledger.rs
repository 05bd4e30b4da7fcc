//! Per-owner append-only record storage.
//!
//! Records are packed into pages of [`PAGE_SIZE`] at `(REC_PAGE, owner, page)`
//! and the owner's count lives at `(REC_CNT, owner)`. Record `i` sits at slot
//! `i % PAGE_SIZE` of page `i / PAGE_SIZE`. The count is written in the same
//! invocation as the record it covers, so `record_count == number of stored
//! records` holds after every committed append.

use soroban_sdk::{symbol_short, Address, Env, Symbol, Vec};

use common::Handle;

use crate::Record;

pub const PAGE_SIZE: u32 = 32;

const REC_PAGE: Symbol = symbol_short!("REC_PAGE");
const REC_COUNT: Symbol = symbol_short!("REC_CNT");
const LEDGER_TTL_THRESHOLD: u32 = 5_184_000; // ~300 days (@ ~5s/ledger)
const LEDGER_TTL_EXTEND_TO: u32 = 10_368_000; // ~600 days (@ ~5s/ledger)

fn extend_count_ttl(env: &Env, key: &(Symbol, Address)) {
    env.storage()
        .persistent()
        .extend_ttl(key, LEDGER_TTL_THRESHOLD, LEDGER_TTL_EXTEND_TO);
}

fn extend_page_ttl(env: &Env, key: &(Symbol, Address, u32)) {
    env.storage()
        .persistent()
        .extend_ttl(key, LEDGER_TTL_THRESHOLD, LEDGER_TTL_EXTEND_TO);
}

fn load_page(env: &Env, owner: &Address, page: u32) -> Vec<Record> {
    env.storage()
        .persistent()
        .get(&(REC_PAGE, owner.clone(), page))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn record_count(env: &Env, owner: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&(REC_COUNT, owner.clone()))
        .unwrap_or(0)
}

/// Appends a record stamped with the current ledger time. Returns the new
/// record's index and timestamp.
pub fn append(env: &Env, owner: &Address, encrypted_minutes: Handle) -> (u32, u64) {
    let index = record_count(env, owner);
    let record = Record {
        owner: owner.clone(),
        encrypted_minutes,
        timestamp: env.ledger().timestamp(),
    };
    let timestamp = record.timestamp;

    let page = index / PAGE_SIZE;
    let mut records = load_page(env, owner, page);
    records.push_back(record);
    let page_key = (REC_PAGE, owner.clone(), page);
    env.storage().persistent().set(&page_key, &records);
    extend_page_ttl(env, &page_key);

    let count_key = (REC_COUNT, owner.clone());
    env.storage()
        .persistent()
        .set(&count_key, &index.saturating_add(1));
    extend_count_ttl(env, &count_key);

    (index, timestamp)
}

pub fn get(env: &Env, owner: &Address, index: u32) -> Option<Record> {
    if index >= record_count(env, owner) {
        return None;
    }
    load_page(env, owner, index / PAGE_SIZE).get(index % PAGE_SIZE)
}

/// Encrypted minutes of the first `count` records of `owner` with
/// `start_time <= timestamp < end_time`, in append order.
pub fn minutes_in_window(
    env: &Env,
    owner: &Address,
    count: u32,
    start_time: u64,
    end_time: u64,
) -> Vec<Handle> {
    let mut out = Vec::new(env);
    if count == 0 {
        return out;
    }
    for page in 0..=((count - 1) / PAGE_SIZE) {
        for record in load_page(env, owner, page).iter() {
            if record.timestamp >= start_time && record.timestamp < end_time {
                out.push_back(record.encrypted_minutes);
            }
        }
    }
    out
}

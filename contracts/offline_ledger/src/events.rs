#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{contracttype, symbol_short, Address, Env};

/// Fired once when the ledger is initialized.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub coprocessor: Address,
    pub timestamp: u64,
}

/// Fired when a record is appended. Carries no plaintext.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordAddedEvent {
    pub owner: Address,
    pub index: u32,
    pub timestamp: u64,
}

/// Fired when statistics are computed and shared with a viewer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatsComputedEvent {
    pub owner: Address,
    pub viewer: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub record_count: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessChangedEvent {
    pub owner: Address,
    pub viewer: Address,
    pub timestamp: u64,
}

pub fn publish_initialized(env: &Env, admin: Address, coprocessor: Address) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            coprocessor,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_record_added(env: &Env, owner: Address, index: u32, timestamp: u64) {
    env.events().publish(
        (symbol_short!("REC_ADD"), owner.clone()),
        RecordAddedEvent {
            owner,
            index,
            timestamp,
        },
    );
}

pub fn publish_stats_computed(
    env: &Env,
    owner: Address,
    viewer: Address,
    start_time: u64,
    end_time: u64,
    record_count: u32,
) {
    let topics = (symbol_short!("STATS"), owner.clone(), viewer.clone());
    let data = StatsComputedEvent {
        owner,
        viewer,
        start_time,
        end_time,
        record_count,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_access_granted(env: &Env, owner: Address, viewer: Address) {
    let topics = (symbol_short!("ACC_GRT"), owner.clone(), viewer.clone());
    let data = AccessChangedEvent {
        owner,
        viewer,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

pub fn publish_access_revoked(env: &Env, owner: Address, viewer: Address) {
    let topics = (symbol_short!("ACC_REV"), owner.clone(), viewer.clone());
    let data = AccessChangedEvent {
        owner,
        viewer,
        timestamp: env.ledger().timestamp(),
    };
    env.events().publish(topics, data);
}

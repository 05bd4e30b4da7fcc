#![allow(deprecated)] // events().publish migration tracked separately

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

use common::Handle;

/// Fired when a user encrypts an input for a contract.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputEncryptedEvent {
    pub user: Address,
    pub contract: Address,
    pub handle: Handle,
    pub timestamp: u64,
}

/// Fired when an account is newly allowed on a handle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandleAllowedEvent {
    pub handle: Handle,
    pub granted_by: Address,
    pub account: Address,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerRegisteredEvent {
    pub user: Address,
    pub public_key: BytesN<32>,
    pub timestamp: u64,
}

pub fn publish_input(env: &Env, user: Address, contract: Address, handle: Handle) {
    env.events().publish(
        (symbol_short!("INPUT"), user.clone()),
        InputEncryptedEvent {
            user,
            contract,
            handle,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_allowed(env: &Env, handle: Handle, granted_by: Address, account: Address) {
    env.events().publish(
        (symbol_short!("ALLOW"), account.clone()),
        HandleAllowedEvent {
            handle,
            granted_by,
            account,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_signer_registered(env: &Env, user: Address, public_key: BytesN<32>) {
    env.events().publish(
        (symbol_short!("SIGNER"), user.clone()),
        SignerRegisteredEvent {
            user,
            public_key,
            timestamp: env.ledger().timestamp(),
        },
    );
}

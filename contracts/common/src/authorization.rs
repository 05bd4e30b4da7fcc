//! Decryption authorizations.
//!
//! The client signs [`authorization_message`] with the account key and
//! [`decrypt_request_message`] with the session key. The coprocessor rebuilds
//! both byte strings and verifies them, so the layouts here are the protocol.

use soroban_sdk::{contracttype, xdr::ToXdr, Address, Bytes, BytesN, Env, Vec};

use crate::handle::Handle;
use crate::stats::SECONDS_PER_DAY;

pub const AUTHORIZATION_DOMAIN: &[u8; 24] = b"offline-time/decrypt/v1\0";
pub const REQUEST_DOMAIN: &[u8; 24] = b"offline-time/request/v1\0";

pub const MAX_DURATION_DAYS: u32 = 365;

/// Wire form of a decryption authorization. The session private key never
/// leaves the client and is not part of this type.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptionAuthorization {
    pub user_address: Address,
    pub contract_addresses: Vec<Address>,
    /// ed25519 session public key generated by the client.
    pub public_key: BytesN<32>,
    /// Account signature over [`authorization_message`].
    pub signature: BytesN<64>,
    pub start_timestamp: u64,
    pub duration_days: u32,
}

/// One handle to decrypt, together with the contract it belongs to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecryptRequest {
    pub handle: Handle,
    pub contract: Address,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WindowStatus {
    NotYetValid,
    Valid,
    Expired,
}

/// First second at which an authorization starting at `start` is no longer
/// valid.
pub fn expires_at(start: u64, duration_days: u32) -> u64 {
    start.saturating_add((duration_days as u64).saturating_mul(SECONDS_PER_DAY))
}

/// Position of `now` relative to `[start, start + duration_days)`.
pub fn window_status(start: u64, duration_days: u32, now: u64) -> WindowStatus {
    if now < start {
        WindowStatus::NotYetValid
    } else if now >= expires_at(start, duration_days) {
        WindowStatus::Expired
    } else {
        WindowStatus::Valid
    }
}

/// Bytes the account owner signs to bind a session key to a contract set and
/// a validity window.
pub fn authorization_message(
    env: &Env,
    user: &Address,
    public_key: &BytesN<32>,
    contracts: &Vec<Address>,
    start_timestamp: u64,
    duration_days: u32,
) -> Bytes {
    let mut data = Bytes::new(env);
    data.extend_from_array(AUTHORIZATION_DOMAIN);
    data.append(&user.clone().to_xdr(env));
    data.extend_from_array(&public_key.to_array());
    data.extend_from_array(&start_timestamp.to_be_bytes());
    data.extend_from_array(&duration_days.to_be_bytes());
    data.extend_from_array(&contracts.len().to_be_bytes());
    for contract in contracts.iter() {
        data.append(&contract.to_xdr(env));
    }
    data
}

/// Bytes the session key signs for one decrypt batch.
pub fn decrypt_request_message(env: &Env, requests: &Vec<DecryptRequest>) -> Bytes {
    let mut data = Bytes::new(env);
    data.extend_from_array(REQUEST_DOMAIN);
    data.extend_from_array(&requests.len().to_be_bytes());
    for request in requests.iter() {
        data.extend_from_array(&request.handle.to_array());
        data.append(&request.contract.to_xdr(env));
    }
    data
}

#![no_std]

//! Private offline-time ledger.
//!
//! Users append encrypted minute counts; the ledger keeps them per owner in
//! append order and computes encrypted statistics over a time window for the
//! owner or for viewers the owner has granted access to. All arithmetic is
//! delegated to the homomorphic coprocessor through [`CoprocessorClient`].

pub mod access;
pub mod aggregation;
pub mod events;
pub mod ledger;


use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Bytes, Env,
    Symbol,
};

use common::{AggregateResult, CoprocessorClient, Handle};

const ADMIN: Symbol = symbol_short!("ADMIN");
const COPROCESSOR: Symbol = symbol_short!("COPROC");
const INITIALIZED: Symbol = symbol_short!("INIT");
const INSTANCE_TTL_THRESHOLD: u32 = 518_400; // ~30 days (@ ~5s/ledger)
const INSTANCE_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days (@ ~5s/ledger)

/// One encrypted entry. Immutable once appended.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: Address,
    pub encrypted_minutes: Handle,
    pub timestamp: u64,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    AccessDenied = 4,
    IndexOutOfRange = 5,
    InvalidProof = 6,
}

fn coprocessor_address(env: &Env) -> Result<Address, ContractError> {
    let address: Address = env
        .storage()
        .instance()
        .get(&COPROCESSOR)
        .ok_or(ContractError::NotInitialized)?;
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND_TO);
    Ok(address)
}

fn require_initialized(env: &Env) -> Result<(), ContractError> {
    if env.storage().instance().has(&INITIALIZED) {
        Ok(())
    } else {
        Err(ContractError::NotInitialized)
    }
}

#[contract]
pub struct OfflineLedgerContract;

#[contractimpl]
impl OfflineLedgerContract {
    /// Binds the ledger to its coprocessor. Callable once.
    pub fn initialize(env: Env, admin: Address, coprocessor: Address) -> Result<(), ContractError> {
        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }
        admin.require_auth();

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&COPROCESSOR, &coprocessor);
        env.storage().instance().set(&INITIALIZED, &true);
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND_TO);

        events::publish_initialized(&env, admin, coprocessor);
        Ok(())
    }

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    pub fn get_coprocessor(env: Env) -> Result<Address, ContractError> {
        coprocessor_address(&env)
    }

    // ── Record ledger ────────────────────────────────────────────────────────

    /// Appends an encrypted minute count to `owner`'s ledger.
    ///
    /// `input_proof` must bind `encrypted_minutes` to `owner` and to this
    /// contract. No decrypt rights are handed out.
    pub fn add_offline_record(
        env: Env,
        owner: Address,
        encrypted_minutes: Handle,
        input_proof: Bytes,
    ) -> Result<u32, ContractError> {
        owner.require_auth();
        let coprocessor = CoprocessorClient::new(&env, &coprocessor_address(&env)?);

        if !coprocessor.verify_input(
            &env.current_contract_address(),
            &owner,
            &encrypted_minutes,
            &input_proof,
        ) {
            return Err(ContractError::InvalidProof);
        }

        let (index, timestamp) = ledger::append(&env, &owner, encrypted_minutes);
        events::publish_record_added(&env, owner, index, timestamp);
        Ok(index)
    }

    pub fn get_record_count(env: Env, owner: Address) -> Result<u32, ContractError> {
        require_initialized(&env)?;
        Ok(ledger::record_count(&env, &owner))
    }

    pub fn get_record(env: Env, owner: Address, index: u32) -> Result<Record, ContractError> {
        require_initialized(&env)?;
        ledger::get(&env, &owner, index).ok_or(ContractError::IndexOutOfRange)
    }

    /// `(record_count, has_records)` for `owner`.
    pub fn get_user_info(env: Env, owner: Address) -> Result<(u32, bool), ContractError> {
        require_initialized(&env)?;
        let count = ledger::record_count(&env, &owner);
        Ok((count, count > 0))
    }

    // ── Aggregation ──────────────────────────────────────────────────────────

    /// Computes encrypted statistics over `owner`'s records with
    /// `start_time <= timestamp < end_time` and lets `viewer` decrypt them.
    ///
    /// Granting the decrypt rights is a write, so this must be submitted as a
    /// transaction. Re-running it over an unchanged ledger returns the same
    /// result.
    pub fn compute_stats(
        env: Env,
        viewer: Address,
        owner: Address,
        start_time: u64,
        end_time: u64,
    ) -> Result<AggregateResult, ContractError> {
        viewer.require_auth();
        let coprocessor = CoprocessorClient::new(&env, &coprocessor_address(&env)?);

        if !access::has_access(&env, &owner, &viewer) {
            return Err(ContractError::AccessDenied);
        }

        let result = aggregation::fold(&env, &coprocessor, &owner, start_time, end_time);
        aggregation::share_with(&env, &coprocessor, &result, &viewer);

        events::publish_stats_computed(
            &env,
            owner,
            viewer,
            start_time,
            end_time,
            result.record_count,
        );
        Ok(result)
    }

    // ── Access control ───────────────────────────────────────────────────────

    pub fn grant_access(
        env: Env,
        caller: Address,
        owner: Address,
        viewer: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        require_initialized(&env)?;
        if caller != owner {
            return Err(ContractError::Unauthorized);
        }
        if access::grant(&env, &owner, &viewer) {
            events::publish_access_granted(&env, owner, viewer);
        }
        Ok(())
    }

    pub fn revoke_access(
        env: Env,
        caller: Address,
        owner: Address,
        viewer: Address,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        require_initialized(&env)?;
        if caller != owner {
            return Err(ContractError::Unauthorized);
        }
        if access::revoke(&env, &owner, &viewer) {
            events::publish_access_revoked(&env, owner, viewer);
        }
        Ok(())
    }

    pub fn check_access_permission(
        env: Env,
        owner: Address,
        viewer: Address,
    ) -> Result<bool, ContractError> {
        require_initialized(&env)?;
        Ok(access::has_access(&env, &owner, &viewer))
    }
}

#![no_std]

//! Development homomorphic coprocessor.
//!
//! Stands in for the external coprocessor on local networks and in tests. It
//! implements the same surface as the real service: encrypted inputs bound to
//! a (user, contract) pair, a closed algebra over handles, a per-handle ACL and
//! authorized user decryption. Values are kept in contract storage and are
//! only handed out through [`CoprocessorContract::user_decrypt`]. It provides
//! no confidentiality of its own.

mod acl;
mod decrypt;
pub mod events;
mod inputs;
mod values;


use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, vec, Address, Bytes, BytesN, Env, Map,
    Vec,
};

use common::{DecryptRequest, DecryptionAuthorization, FoldedStats, Handle, HandleKind};

use values::Op;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    InputNonce,
    Value(Handle),
    Input(Handle),
    Signer(Address),
}

/// Stored plaintext of a handle and the accounts allowed to use it.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ciphertext {
    pub value: u64,
    pub allowed: Vec<Address>,
}

/// Handle plus the proof that binds it to its (user, contract) pair.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptedInput {
    pub handle: Handle,
    pub proof: Bytes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputBinding {
    pub user: Address,
    pub contract: Address,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum CoprocessorError {
    HandleNotFound = 1,
    HandleNotAllowed = 2,
    KindMismatch = 3,
    DivisionByZero = 4,
    InvalidAuthorization = 5,
    AuthorizationExpired = 6,
    AuthorizationNotYetValid = 7,
    UnauthorizedContract = 8,
    SignerNotRegistered = 9,
}

#[contract]
pub struct CoprocessorContract;

#[contractimpl]
impl CoprocessorContract {
    // ── Inputs ───────────────────────────────────────────────────────────────

    /// Encrypts `value` for use by `contract` on behalf of `user`.
    pub fn encrypt_input(env: Env, user: Address, contract: Address, value: u64) -> EncryptedInput {
        user.require_auth();
        inputs::encrypt(&env, &user, &contract, value)
    }

    pub fn verify_input(
        env: Env,
        contract: Address,
        user: Address,
        handle: Handle,
        proof: Bytes,
    ) -> bool {
        contract.require_auth();
        inputs::verify(&env, &contract, &user, &handle, &proof)
    }

    // ── Handle algebra ───────────────────────────────────────────────────────

    pub fn add(env: Env, caller: Address, lhs: Handle, rhs: Handle) -> Result<Handle, CoprocessorError> {
        caller.require_auth();
        let a = values::operand(&env, &caller, &lhs, HandleKind::Uint64)?;
        let b = values::operand(&env, &caller, &rhs, HandleKind::Uint64)?;
        Ok(values::store_result(
            &env,
            &caller,
            Op::Add,
            &vec![&env, lhs.clone(), rhs.clone()],
            0,
            HandleKind::Uint64,
            a.wrapping_add(b),
        ))
    }

    pub fn gt(env: Env, caller: Address, lhs: Handle, rhs: Handle) -> Result<Handle, CoprocessorError> {
        caller.require_auth();
        let a = values::operand(&env, &caller, &lhs, HandleKind::Uint64)?;
        let b = values::operand(&env, &caller, &rhs, HandleKind::Uint64)?;
        Ok(values::store_result(
            &env,
            &caller,
            Op::Gt,
            &vec![&env, lhs.clone(), rhs.clone()],
            0,
            HandleKind::Bool,
            u64::from(a > b),
        ))
    }

    pub fn select(
        env: Env,
        caller: Address,
        cond: Handle,
        if_true: Handle,
        if_false: Handle,
    ) -> Result<Handle, CoprocessorError> {
        caller.require_auth();
        let c = values::operand(&env, &caller, &cond, HandleKind::Bool)?;
        let t = values::operand(&env, &caller, &if_true, HandleKind::Uint64)?;
        let f = values::operand(&env, &caller, &if_false, HandleKind::Uint64)?;
        Ok(values::store_result(
            &env,
            &caller,
            Op::Select,
            &vec![&env, cond.clone(), if_true.clone(), if_false.clone()],
            0,
            HandleKind::Uint64,
            if c != 0 { t } else { f },
        ))
    }

    pub fn div_scalar(
        env: Env,
        caller: Address,
        lhs: Handle,
        divisor: u64,
    ) -> Result<Handle, CoprocessorError> {
        caller.require_auth();
        if divisor == 0 {
            return Err(CoprocessorError::DivisionByZero);
        }
        let a = values::operand(&env, &caller, &lhs, HandleKind::Uint64)?;
        Ok(values::store_result(
            &env,
            &caller,
            Op::DivScalar,
            &vec![&env, lhs.clone()],
            divisor,
            HandleKind::Uint64,
            a / divisor,
        ))
    }

    /// Encrypted sum, maximum and integer mean of `inputs`, computed in a
    /// single pass. Only the three results are stored, each readable by
    /// `caller`. An empty list yields zero handles.
    pub fn fold_stats(
        env: Env,
        caller: Address,
        inputs: Vec<Handle>,
    ) -> Result<FoldedStats, CoprocessorError> {
        caller.require_auth();
        values::fold(&env, &caller, &inputs)
    }

    // ── Access control ───────────────────────────────────────────────────────

    pub fn allow(
        env: Env,
        caller: Address,
        handle: Handle,
        account: Address,
    ) -> Result<(), CoprocessorError> {
        caller.require_auth();
        acl::allow_from(&env, &caller, &handle, &account)
    }

    pub fn is_allowed(env: Env, handle: Handle, account: Address) -> bool {
        acl::is_allowed(&env, &handle, &account)
    }

    // ── User decryption ──────────────────────────────────────────────────────

    /// Registers the ed25519 key that signs `user`'s decryption
    /// authorizations. Re-registering replaces the key.
    pub fn register_signer(env: Env, user: Address, public_key: BytesN<32>) {
        user.require_auth();
        env.storage()
            .persistent()
            .set(&DataKey::Signer(user.clone()), &public_key);
        events::publish_signer_registered(&env, user, public_key);
    }

    pub fn get_signer(env: Env, user: Address) -> Option<BytesN<32>> {
        env.storage().persistent().get(&DataKey::Signer(user))
    }

    /// Decrypts a batch of handles for the holder of `authorization`.
    ///
    /// Handles the user or the named contract may not read, and zero handles,
    /// are left out of the result instead of failing the batch.
    pub fn user_decrypt(
        env: Env,
        requests: Vec<DecryptRequest>,
        authorization: DecryptionAuthorization,
        request_signature: BytesN<64>,
    ) -> Result<Map<Handle, u64>, CoprocessorError> {
        decrypt::check_authorization(&env, &requests, &authorization, &request_signature)?;
        Ok(decrypt::reveal(&env, &requests, &authorization.user_address))
    }
}

use soroban_sdk::{xdr::ToXdr, Address, Bytes, BytesN, Env};

use common::{tag_handle, Handle, HandleKind};

use crate::{acl, events, values, DataKey, EncryptedInput, InputBinding};

pub fn encrypt(env: &Env, user: &Address, contract: &Address, value: u64) -> EncryptedInput {
    let nonce: u64 = env
        .storage()
        .instance()
        .get(&DataKey::InputNonce)
        .unwrap_or(0u64)
        .saturating_add(1);
    env.storage().instance().set(&DataKey::InputNonce, &nonce);

    let mut data = Bytes::new(env);
    data.extend_from_array(b"input");
    data.append(&contract.clone().to_xdr(env));
    data.append(&user.clone().to_xdr(env));
    data.extend_from_array(&nonce.to_be_bytes());
    let handle = tag_handle(env, &env.crypto().sha256(&data).into(), HandleKind::Uint64);

    // The encrypting user already knows the value.
    values::store(env, &handle, value, user);

    let binding_key = DataKey::Input(handle.clone());
    env.storage().persistent().set(
        &binding_key,
        &InputBinding {
            user: user.clone(),
            contract: contract.clone(),
        },
    );
    acl::extend_entry_ttl(env, &binding_key);

    events::publish_input(env, user.clone(), contract.clone(), handle.clone());

    EncryptedInput {
        proof: proof_for(env, &handle, user, contract),
        handle,
    }
}

/// Accepts `proof` only for the exact (handle, user, contract) triple the
/// input was encrypted for, then lets `contract` use the handle.
pub fn verify(env: &Env, contract: &Address, user: &Address, handle: &Handle, proof: &Bytes) -> bool {
    let binding: Option<InputBinding> = env
        .storage()
        .persistent()
        .get(&DataKey::Input(handle.clone()));
    let Some(binding) = binding else {
        return false;
    };
    if &binding.user != user || &binding.contract != contract {
        return false;
    }
    if proof != &proof_for(env, handle, user, contract) {
        return false;
    }
    acl::grant(env, handle, contract);
    true
}

fn proof_for(env: &Env, handle: &Handle, user: &Address, contract: &Address) -> Bytes {
    let mut data = Bytes::new(env);
    data.extend_from_array(b"proof");
    data.extend_from_array(&handle.to_array());
    data.append(&user.clone().to_xdr(env));
    data.append(&contract.clone().to_xdr(env));
    let digest: BytesN<32> = env.crypto().sha256(&data).into();
    Bytes::from_array(env, &digest.to_array())
}

use soroban_sdk::{Address, BytesN, Env, Map, Vec};

use common::{
    authorization_message, decrypt_request_message, is_zero, window_status, DecryptRequest,
    DecryptionAuthorization, Handle, WindowStatus, MAX_DURATION_DAYS,
};

use crate::{acl, values, CoprocessorError, DataKey};

/// Validates an authorization against the ledger clock and the batch it is
/// presented with. Signature failures trap the host.
pub fn check_authorization(
    env: &Env,
    requests: &Vec<DecryptRequest>,
    authorization: &DecryptionAuthorization,
    request_signature: &BytesN<64>,
) -> Result<(), CoprocessorError> {
    if authorization.duration_days == 0
        || authorization.duration_days > MAX_DURATION_DAYS
        || authorization.contract_addresses.is_empty()
    {
        return Err(CoprocessorError::InvalidAuthorization);
    }

    match window_status(
        authorization.start_timestamp,
        authorization.duration_days,
        env.ledger().timestamp(),
    ) {
        WindowStatus::NotYetValid => return Err(CoprocessorError::AuthorizationNotYetValid),
        WindowStatus::Expired => return Err(CoprocessorError::AuthorizationExpired),
        WindowStatus::Valid => {}
    }

    for request in requests.iter() {
        if !authorization.contract_addresses.contains(&request.contract) {
            return Err(CoprocessorError::UnauthorizedContract);
        }
    }

    let signer: BytesN<32> = env
        .storage()
        .persistent()
        .get(&DataKey::Signer(authorization.user_address.clone()))
        .ok_or(CoprocessorError::SignerNotRegistered)?;

    let message = authorization_message(
        env,
        &authorization.user_address,
        &authorization.public_key,
        &authorization.contract_addresses,
        authorization.start_timestamp,
        authorization.duration_days,
    );
    env.crypto()
        .ed25519_verify(&signer, &message, &authorization.signature);
    env.crypto().ed25519_verify(
        &authorization.public_key,
        &decrypt_request_message(env, requests),
        request_signature,
    );
    Ok(())
}

/// Plaintexts for every request that both the user and the named contract
/// may read.
pub fn reveal(env: &Env, requests: &Vec<DecryptRequest>, user: &Address) -> Map<Handle, u64> {
    let mut out = Map::new(env);
    for request in requests.iter() {
        if is_zero(&request.handle) {
            continue;
        }
        if !acl::is_allowed(env, &request.handle, user)
            || !acl::is_allowed(env, &request.handle, &request.contract)
        {
            continue;
        }
        if let Some(value) = values::load(env, &request.handle) {
            out.set(request.handle, value);
        }
    }
    out
}

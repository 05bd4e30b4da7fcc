use common::{is_zero, AggregateResult, DecryptRequest, DecryptionAuthorization, Handle};
use coprocessor::CoprocessorContractClient;
use soroban_sdk::{Address, BytesN, Env, Map, Vec};
use tracing::debug;

use crate::authorization::ClientAuthorization;
use crate::error::{invoke, Result};

/// Something that performs authorized batch decryption.
pub trait DecryptBackend {
    fn user_decrypt(
        &self,
        requests: &Vec<DecryptRequest>,
        authorization: &DecryptionAuthorization,
        request_signature: &BytesN<64>,
    ) -> Result<Map<Handle, u64>>;
}

impl DecryptBackend for CoprocessorContractClient<'_> {
    fn user_decrypt(
        &self,
        requests: &Vec<DecryptRequest>,
        authorization: &DecryptionAuthorization,
        request_signature: &BytesN<64>,
    ) -> Result<Map<Handle, u64>> {
        invoke(self.try_user_decrypt(requests, authorization, request_signature))
    }
}

/// Plaintext statistics. `None` means the value is absent or not yet
/// readable by this user, never zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecryptedStats {
    pub total: Option<u64>,
    pub average: Option<u64>,
    pub max: Option<u64>,
    pub best_record: Option<u64>,
    pub record_count: u32,
}

/// Decrypts `handles` from `contract`. Zero handles are never sent; a batch
/// made only of zero handles does not reach the backend.
pub fn decrypt_handles(
    env: &Env,
    backend: &dyn DecryptBackend,
    authorization: &ClientAuthorization,
    contract: &Address,
    handles: &[&Handle],
) -> Result<Map<Handle, u64>> {
    let mut requests = Vec::new(env);
    for handle in handles.iter().filter(|handle| !is_zero(handle)) {
        let request = DecryptRequest {
            handle: (*handle).clone(),
            contract: contract.clone(),
        };
        if !requests.contains(&request) {
            requests.push_back(request);
        }
    }
    if requests.is_empty() {
        return Ok(Map::new(env));
    }

    let signature = authorization.sign_requests(env, &requests);
    let plaintexts = backend.user_decrypt(&requests, authorization.authorization(), &signature)?;
    debug!(
        requested = requests.len(),
        returned = plaintexts.len(),
        "batch decrypted"
    );
    Ok(plaintexts)
}

pub fn decrypt_stats(
    env: &Env,
    backend: &dyn DecryptBackend,
    authorization: &ClientAuthorization,
    ledger: &Address,
    result: &AggregateResult,
) -> Result<DecryptedStats> {
    let plaintexts = decrypt_handles(
        env,
        backend,
        authorization,
        ledger,
        &[&result.total, &result.average, &result.max, &result.best_record],
    )?;
    let lookup = |handle: &Handle| {
        if is_zero(handle) {
            None
        } else {
            plaintexts.get(handle.clone())
        }
    };
    Ok(DecryptedStats {
        total: lookup(&result.total),
        average: lookup(&result.average),
        max: lookup(&result.max),
        best_record: lookup(&result.best_record),
        record_count: result.record_count,
    })
}

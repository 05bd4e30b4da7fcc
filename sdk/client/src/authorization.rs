//! Client side of the decryption authorization protocol.
//!
//! An authorization binds a freshly generated session key to a user, a set of
//! contracts and a validity window. The account signer signs it once; the
//! session key then signs every decrypt batch until the window closes. Signed
//! authorizations are cached per `(contract set, user)` in an
//! [`AuthorizationStorage`].

use common::{
    authorization_message, decrypt_request_message, expires_at, window_status, DecryptRequest,
    DecryptionAuthorization, WindowStatus, MAX_DURATION_DAYS,
};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use soroban_sdk::{
    xdr::{FromXdr, ToXdr},
    Address, Bytes, BytesN, Env, Vec,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{ClientError, Result};
use crate::signer::AccountSigner;
use crate::storage::AuthorizationStorage;

const CACHE_KEY_PREFIX: &str = "offline-time:authorization:";

/// A signed authorization together with its session private key.
#[derive(Clone)]
pub struct ClientAuthorization {
    authorization: DecryptionAuthorization,
    session_key: SigningKey,
}

impl std::fmt::Debug for ClientAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientAuthorization")
            .field("authorization", &self.authorization)
            .finish_non_exhaustive()
    }
}

impl ClientAuthorization {
    /// Wire form presented to the coprocessor.
    pub fn authorization(&self) -> &DecryptionAuthorization {
        &self.authorization
    }

    pub fn expires_at(&self) -> u64 {
        expires_at(
            self.authorization.start_timestamp,
            self.authorization.duration_days,
        )
    }

    pub fn is_valid_at(&self, now: u64) -> bool {
        window_status(
            self.authorization.start_timestamp,
            self.authorization.duration_days,
            now,
        ) == WindowStatus::Valid
    }

    /// Whether the account signature verifies under `account_key`. Fails once
    /// the account has registered a different signer.
    pub fn is_signed_by(&self, env: &Env, account_key: &[u8; 32]) -> bool {
        let wire = &self.authorization;
        let message = authorization_message(
            env,
            &wire.user_address,
            &wire.public_key,
            &wire.contract_addresses,
            wire.start_timestamp,
            wire.duration_days,
        );
        let Ok(key) = VerifyingKey::from_bytes(account_key) else {
            return false;
        };
        key.verify_strict(
            &to_vec(&message),
            &Signature::from_bytes(&wire.signature.to_array()),
        )
        .is_ok()
    }

    /// Session-key signature over one decrypt batch.
    pub fn sign_requests(&self, env: &Env, requests: &Vec<DecryptRequest>) -> BytesN<64> {
        let message = to_vec(&decrypt_request_message(env, requests));
        BytesN::from_array(env, &self.session_key.sign(&message).to_bytes())
    }
}

/// Where a cached authorization stands at a given time.
#[derive(Debug)]
pub enum AuthorizationState {
    Unsigned,
    Signed(ClientAuthorization),
    Expired(ClientAuthorization),
    /// Signed by a key the account no longer uses.
    SignerChanged(ClientAuthorization),
}

impl AuthorizationState {
    pub fn resolve(
        env: &Env,
        cached: Option<ClientAuthorization>,
        now: u64,
        account_key: &[u8; 32],
    ) -> Self {
        match cached {
            None => AuthorizationState::Unsigned,
            Some(auth) if !auth.is_signed_by(env, account_key) => {
                AuthorizationState::SignerChanged(auth)
            }
            Some(auth) if auth.is_valid_at(now) => AuthorizationState::Signed(auth),
            Some(auth) => AuthorizationState::Expired(auth),
        }
    }
}

/// Returns a valid authorization for `signer` over `contracts`, reusing the
/// cached one when it is still inside its window and was signed by the
/// signer's current key, and asking the signer for a new one otherwise.
///
/// A declined signature leaves the cache as it was.
#[instrument(skip(env, contracts, signer, storage), fields(user = ?signer.address()))]
pub fn load_or_sign(
    env: &Env,
    contracts: &Vec<Address>,
    signer: &dyn AccountSigner,
    storage: &dyn AuthorizationStorage,
    now: u64,
    duration_days: u32,
) -> Result<ClientAuthorization> {
    if duration_days == 0 || duration_days > MAX_DURATION_DAYS {
        return Err(ClientError::InvalidDuration(duration_days));
    }
    if contracts.is_empty() {
        return Err(ClientError::EmptyContractSet);
    }

    let key = cache_key(env, signer.address(), contracts);
    let cached = match storage.get_item(&key)? {
        Some(raw) => match decode(env, &raw) {
            Ok(auth) => Some(auth),
            Err(err) => {
                warn!(error = %err, "discarding unreadable cached authorization");
                storage.remove_item(&key)?;
                None
            }
        },
        None => None,
    };

    match AuthorizationState::resolve(env, cached, now, &signer.public_key()) {
        AuthorizationState::Signed(auth) => {
            debug!(expires_at = auth.expires_at(), "reusing cached authorization");
            return Ok(auth);
        }
        AuthorizationState::Expired(auth) => {
            info!(expired_at = auth.expires_at(), "cached authorization expired, re-signing");
        }
        AuthorizationState::SignerChanged(auth) => {
            warn!(
                start_timestamp = auth.authorization.start_timestamp,
                "cached authorization signed by a replaced key, re-signing"
            );
        }
        AuthorizationState::Unsigned => {
            debug!("no cached authorization, signing");
        }
    }

    let session_key = SigningKey::generate(&mut OsRng);
    let public_key = BytesN::from_array(env, &session_key.verifying_key().to_bytes());
    let message = authorization_message(
        env,
        signer.address(),
        &public_key,
        contracts,
        now,
        duration_days,
    );
    let signature = signer.sign_message(&to_vec(&message))?;

    let auth = ClientAuthorization {
        authorization: DecryptionAuthorization {
            user_address: signer.address().clone(),
            contract_addresses: contracts.clone(),
            public_key,
            signature: BytesN::from_array(env, &signature),
            start_timestamp: now,
            duration_days,
        },
        session_key,
    };
    storage.set_item(&key, encode(&auth)?)?;
    info!(expires_at = auth.expires_at(), "stored new authorization");
    Ok(auth)
}

/// Cache key for `(contracts, user)`. The order of `contracts` does not
/// matter.
pub fn cache_key(env: &Env, user: &Address, contracts: &Vec<Address>) -> String {
    let mut encoded: std::vec::Vec<std::vec::Vec<u8>> = contracts
        .iter()
        .map(|contract| to_vec(&contract.to_xdr(env)))
        .collect();
    encoded.sort();
    encoded.dedup();

    let mut data = Bytes::new(env);
    data.append(&user.clone().to_xdr(env));
    for contract in &encoded {
        data.extend_from_slice(contract);
    }
    let digest: BytesN<32> = env.crypto().sha256(&data).into();
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(digest.to_array()))
}

pub(crate) fn to_vec(bytes: &Bytes) -> std::vec::Vec<u8> {
    bytes.iter().collect()
}

#[derive(Debug, Deserialize, Serialize)]
struct StoredAuthorization {
    user_address: String,
    contract_addresses: std::vec::Vec<String>,
    public_key: String,
    private_key: String,
    signature: String,
    start_timestamp: u64,
    duration_days: u32,
}

fn encode_address(env: &Env, address: &Address) -> String {
    hex::encode(to_vec(&address.clone().to_xdr(env)))
}

fn decode_address(env: &Env, raw: &str) -> Result<Address> {
    let bytes = hex::decode(raw)
        .map_err(|err| ClientError::InvalidCachedAuthorization(err.to_string()))?;
    Address::from_xdr(env, &Bytes::from_slice(env, &bytes))
        .map_err(|_| ClientError::InvalidCachedAuthorization("bad address".to_string()))
}

fn decode_array<const N: usize>(raw: &str, what: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(raw)
        .map_err(|err| ClientError::InvalidCachedAuthorization(format!("{what}: {err}")))?;
    bytes
        .try_into()
        .map_err(|_| ClientError::InvalidCachedAuthorization(format!("{what}: wrong length")))
}

fn encode(auth: &ClientAuthorization) -> Result<String> {
    let wire = &auth.authorization;
    let env = wire.user_address.env();
    let stored = StoredAuthorization {
        user_address: encode_address(env, &wire.user_address),
        contract_addresses: wire
            .contract_addresses
            .iter()
            .map(|contract| encode_address(env, &contract))
            .collect(),
        public_key: hex::encode(wire.public_key.to_array()),
        private_key: hex::encode(auth.session_key.to_bytes()),
        signature: hex::encode(wire.signature.to_array()),
        start_timestamp: wire.start_timestamp,
        duration_days: wire.duration_days,
    };
    Ok(serde_json::to_string(&stored)?)
}

fn decode(env: &Env, raw: &str) -> Result<ClientAuthorization> {
    let stored: StoredAuthorization = serde_json::from_str(raw)?;

    let public_key: [u8; 32] = decode_array(&stored.public_key, "public key")?;
    let private_key: [u8; 32] = decode_array(&stored.private_key, "private key")?;
    let signature: [u8; 64] = decode_array(&stored.signature, "signature")?;
    let session_key = SigningKey::from_bytes(&private_key);
    if session_key.verifying_key().to_bytes() != public_key {
        return Err(ClientError::InvalidCachedAuthorization(
            "session key pair mismatch".to_string(),
        ));
    }

    let mut contract_addresses = Vec::new(env);
    for contract in &stored.contract_addresses {
        contract_addresses.push_back(decode_address(env, contract)?);
    }

    Ok(ClientAuthorization {
        authorization: DecryptionAuthorization {
            user_address: decode_address(env, &stored.user_address)?,
            contract_addresses,
            public_key: BytesN::from_array(env, &public_key),
            signature: BytesN::from_array(env, &signature),
            start_timestamp: stored.start_timestamp,
            duration_days: stored.duration_days,
        },
        session_key,
    })
}

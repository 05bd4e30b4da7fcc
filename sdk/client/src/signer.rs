//! Account signers.
//!
//! The account signer stands for the user's wallet: it owns the key
//! registered with the coprocessor and is asked to sign each new decryption
//! authorization. It may decline.

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use soroban_sdk::Address;

use crate::error::Result;

pub trait AccountSigner {
    /// On-ledger account the signatures speak for.
    fn address(&self) -> &Address;

    /// ed25519 public key registered for [`Self::address`].
    fn public_key(&self) -> [u8; 32];

    /// Signs `message`, or fails with
    /// [`ClientError::SignatureRejected`](crate::ClientError::SignatureRejected).
    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64]>;
}

/// Signer holding its key in memory.
#[derive(Clone)]
pub struct LocalSigner {
    address: Address,
    signing_key: SigningKey,
}

impl LocalSigner {
    pub fn generate(address: Address) -> Self {
        Self {
            address,
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(address: Address, secret: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            address,
            signing_key: SigningKey::from_bytes(secret),
        }
    }
}

impl AccountSigner for LocalSigner {
    fn address(&self) -> &Address {
        &self.address
    }

    fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    fn sign_message(&self, message: &[u8]) -> Result<[u8; 64]> {
        Ok(self.signing_key.sign(message).to_bytes())
    }
}

//! Client SDK for the offline-time ledger.
//!
//! Wraps the ledger and coprocessor contracts with the pieces a wallet-facing
//! application needs: encrypted record submission, the two-phase stats
//! query, cached decryption authorizations and staleness detection when the
//! user switches account or network.

pub mod authorization;
pub mod client;
pub mod decrypt;
pub mod error;
pub mod query;
pub mod session;
pub mod signer;
pub mod storage;

pub use authorization::{cache_key, load_or_sign, AuthorizationState, ClientAuthorization};
pub use client::{ClientConfig, OfflineTimeClient};
pub use decrypt::{decrypt_handles, decrypt_stats, DecryptBackend, DecryptedStats};
pub use error::{ClientError, Result};
pub use query::{QueryState, StatsQuery};
pub use session::{SessionFingerprint, SessionGuard, SharedSession};
pub use signer::{AccountSigner, LocalSigner};
pub use storage::{AuthorizationStorage, MemoryStorage};

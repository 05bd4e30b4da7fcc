//! Session fingerprints.
//!
//! Every operation that spans more than one call captures the fingerprint of
//! the session it started in and checks it again before handing back a
//! result. A mismatch means the user switched account, network or ledger in
//! the meantime and the result belongs to a context that is gone.

use std::cell::RefCell;
use std::rc::Rc;

use soroban_sdk::{Address, Env};
use tracing::warn;

use crate::error::{ClientError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionFingerprint {
    pub account: Address,
    pub network_id: [u8; 32],
    pub ledger: Address,
}

impl SessionFingerprint {
    /// Fingerprint of `account` on the network `env` is connected to.
    pub fn capture(env: &Env, account: Address, ledger: Address) -> Self {
        Self {
            account,
            network_id: env.ledger().network_id().to_array(),
            ledger,
        }
    }
}

/// Session state shared between the client and whatever drives account or
/// network switches.
#[derive(Clone, Debug)]
pub struct SharedSession(Rc<RefCell<SessionFingerprint>>);

impl SharedSession {
    pub fn new(fingerprint: SessionFingerprint) -> Self {
        Self(Rc::new(RefCell::new(fingerprint)))
    }

    pub fn current(&self) -> SessionFingerprint {
        self.0.borrow().clone()
    }

    pub fn switch_account(&self, account: Address) {
        self.0.borrow_mut().account = account;
    }

    pub fn switch_network(&self, network_id: [u8; 32]) {
        self.0.borrow_mut().network_id = network_id;
    }

    pub fn switch_ledger(&self, ledger: Address) {
        self.0.borrow_mut().ledger = ledger;
    }

    /// Captures the current fingerprint.
    pub fn guard(&self) -> SessionGuard {
        SessionGuard {
            session: self.clone(),
            captured: self.current(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionGuard {
    session: SharedSession,
    captured: SessionFingerprint,
}

impl SessionGuard {
    pub fn captured(&self) -> &SessionFingerprint {
        &self.captured
    }

    pub fn is_stale(&self) -> bool {
        self.session.current() != self.captured
    }

    /// Fails with [`ClientError::NetworkStaleness`] once the session moved on.
    pub fn check(&self) -> Result<()> {
        if self.is_stale() {
            warn!(account = ?self.captured.account, "session changed, discarding result");
            return Err(ClientError::NetworkStaleness);
        }
        Ok(())
    }
}

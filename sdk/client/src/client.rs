use common::{AggregateResult, StatsPeriod, MAX_DURATION_DAYS};
use coprocessor::CoprocessorContractClient;
use offline_ledger::{OfflineLedgerContractClient, Record};
use serde::{Deserialize, Serialize};
use soroban_sdk::{vec, Address, BytesN, Env};
use tracing::{info, instrument};

use crate::authorization::{load_or_sign, ClientAuthorization};
use crate::decrypt::{decrypt_handles, decrypt_stats, DecryptedStats};
use crate::error::{invoke, ClientError, Result};
use crate::query::StatsQuery;
use crate::session::{SessionFingerprint, SessionGuard, SharedSession};
use crate::signer::AccountSigner;
use crate::storage::AuthorizationStorage;

/// Client settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Validity of each new decryption authorization, in days.
    pub duration_days: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { duration_days: 1 }
    }
}

impl ClientConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.duration_days == 0 || self.duration_days > MAX_DURATION_DAYS {
            return Err(ClientError::InvalidDuration(self.duration_days));
        }
        Ok(())
    }
}

/// User-facing entry point to the offline-time ledger.
///
/// Every call runs against the ledger and account of the session at the time
/// of the call; results are discarded with [`ClientError::NetworkStaleness`]
/// when the session changes before they are ready.
pub struct OfflineTimeClient<'a> {
    env: Env,
    coprocessor: CoprocessorContractClient<'a>,
    session: SharedSession,
    config: ClientConfig,
}

impl<'a> OfflineTimeClient<'a> {
    pub fn new(
        env: &Env,
        coprocessor: &Address,
        session: SharedSession,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            env: env.clone(),
            coprocessor: CoprocessorContractClient::new(env, coprocessor),
            session,
            config,
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn ledger(&self, fingerprint: &SessionFingerprint) -> OfflineLedgerContractClient<'a> {
        OfflineLedgerContractClient::new(&self.env, &fingerprint.ledger)
    }

    fn start(&self) -> (SessionGuard, OfflineLedgerContractClient<'a>) {
        let guard = self.session.guard();
        let ledger = self.ledger(guard.captured());
        (guard, ledger)
    }

    fn require_account(&self, guard: &SessionGuard, signer: &dyn AccountSigner) -> Result<()> {
        let account = &guard.captured().account;
        if signer.address() != account {
            return Err(ClientError::SignerMismatch {
                signer: format!("{:?}", signer.address()),
                account: format!("{account:?}"),
            });
        }
        Ok(())
    }

    /// Registers the signer's key as the account's decryption signer.
    #[instrument(skip(self, signer), fields(account = ?signer.address()))]
    pub fn register_signer(&self, signer: &dyn AccountSigner) -> Result<()> {
        let guard = self.session.guard();
        self.require_account(&guard, signer)?;
        let public_key = BytesN::from_array(&self.env, &signer.public_key());
        invoke(
            self.coprocessor
                .try_register_signer(signer.address(), &public_key),
        )?;
        guard.check()
    }

    // ── Records ──────────────────────────────────────────────────────────────

    /// Encrypts `minutes` and appends it to the session account's ledger.
    #[instrument(skip(self))]
    pub fn add_record(&self, minutes: u64) -> Result<u32> {
        if minutes == 0 {
            return Err(ClientError::InvalidMinutes);
        }
        let (guard, ledger) = self.start();
        let owner = &guard.captured().account;

        let input = invoke(
            self.coprocessor
                .try_encrypt_input(owner, &ledger.address, &minutes),
        )?;
        guard.check()?;

        let index = invoke(ledger.try_add_offline_record(owner, &input.handle, &input.proof))?;
        guard.check()?;

        info!(index, "record added");
        Ok(index)
    }

    pub fn record_count(&self) -> Result<u32> {
        let (guard, ledger) = self.start();
        invoke(ledger.try_get_record_count(&guard.captured().account))
    }

    pub fn record(&self, owner: &Address, index: u32) -> Result<Record> {
        let (_guard, ledger) = self.start();
        invoke(ledger.try_get_record(owner, &index))
    }

    /// `(record_count, has_records)` for `owner`.
    pub fn user_info(&self, owner: &Address) -> Result<(u32, bool)> {
        let (_guard, ledger) = self.start();
        invoke(ledger.try_get_user_info(owner))
    }

    // ── Access ───────────────────────────────────────────────────────────────

    /// Whether the session account may aggregate over `owner`'s ledger.
    pub fn check_access_permission(&self, owner: &Address) -> Result<bool> {
        let (guard, ledger) = self.start();
        invoke(ledger.try_check_access_permission(owner, &guard.captured().account))
    }

    #[instrument(skip(self))]
    pub fn grant_access(&self, viewer: &Address) -> Result<()> {
        let (guard, ledger) = self.start();
        let owner = &guard.captured().account;
        invoke(ledger.try_grant_access(owner, owner, viewer))?;
        guard.check()
    }

    #[instrument(skip(self))]
    pub fn revoke_access(&self, viewer: &Address) -> Result<()> {
        let (guard, ledger) = self.start();
        let owner = &guard.captured().account;
        invoke(ledger.try_revoke_access(owner, owner, viewer))?;
        guard.check()
    }

    // ── Statistics ───────────────────────────────────────────────────────────

    /// Submits the stats transaction for `owner` over `period` ending at
    /// `now`. The result is fetched with [`StatsQuery::read`] after
    /// [`StatsQuery::confirm`].
    #[instrument(skip(self))]
    pub fn submit_stats(&self, owner: &Address, period: StatsPeriod, now: u64) -> Result<StatsQuery> {
        let (guard, ledger) = self.start();
        let viewer = guard.captured().account.clone();
        let (start_time, end_time) = period.window(now);

        let result = invoke(ledger.try_compute_stats(&viewer, owner, &start_time, &end_time))?;
        info!(start_time, end_time, "stats submitted");
        Ok(StatsQuery::submitted(
            viewer,
            owner.clone(),
            start_time,
            end_time,
            guard,
            result,
        ))
    }

    /// Runs a query through all its phases.
    pub fn stats(&self, owner: &Address, period: StatsPeriod, now: u64) -> Result<AggregateResult> {
        let mut query = self.submit_stats(owner, period, now)?;
        query.confirm()?;
        query.read()
    }

    // ── Decryption ───────────────────────────────────────────────────────────

    fn authorize(
        &self,
        guard: &SessionGuard,
        signer: &dyn AccountSigner,
        storage: &dyn AuthorizationStorage,
        now: u64,
    ) -> Result<ClientAuthorization> {
        self.require_account(guard, signer)?;
        let contracts = vec![&self.env, guard.captured().ledger.clone()];
        let authorization = load_or_sign(
            &self.env,
            &contracts,
            signer,
            storage,
            now,
            self.config.duration_days,
        )?;
        guard.check()?;
        Ok(authorization)
    }

    /// Decrypts a stats result. Fields the account may not read come back as
    /// `None`.
    #[instrument(skip(self, result, signer, storage), fields(record_count = result.record_count))]
    pub fn decrypt_stats(
        &self,
        result: &AggregateResult,
        signer: &dyn AccountSigner,
        storage: &dyn AuthorizationStorage,
        now: u64,
    ) -> Result<DecryptedStats> {
        let guard = self.session.guard();
        let authorization = self.authorize(&guard, signer, storage, now)?;
        let stats = decrypt_stats(
            &self.env,
            &self.coprocessor,
            &authorization,
            &guard.captured().ledger,
            result,
        )?;
        guard.check()?;
        Ok(stats)
    }

    /// Decrypts one of the session account's own records.
    #[instrument(skip(self, signer, storage))]
    pub fn decrypt_record(
        &self,
        index: u32,
        signer: &dyn AccountSigner,
        storage: &dyn AuthorizationStorage,
        now: u64,
    ) -> Result<Option<u64>> {
        let (guard, ledger) = self.start();
        let record = invoke(ledger.try_get_record(&guard.captured().account, &index))?;
        let authorization = self.authorize(&guard, signer, storage, now)?;
        let plaintexts = decrypt_handles(
            &self.env,
            &self.coprocessor,
            &authorization,
            &ledger.address,
            &[&record.encrypted_minutes],
        )?;
        guard.check()?;
        Ok(plaintexts.get(record.encrypted_minutes))
    }
}

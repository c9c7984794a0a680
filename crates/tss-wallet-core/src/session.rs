//! Wallet session resolution
//!
//! [`WalletClient`] turns authenticated users into [`Wallet`] handles. The
//! cache is consulted first; only when this device holds no share does the
//! client run an acquisition protocol against the engine:
//!
//! ```text
//! identify ──► cache hit? ──yes──► Wallet
//!                 │ no
//!                 ▼
//!                dkg ──created──► persist ──► Wallet
//!                 │ conflict
//!                 ▼
//!          register_device ──► persist ──► Wallet
//! ```
//!
//! A conflict means the wallet already exists server-side, so this device
//! registers as an additional share holder instead of creating a new one.
//! Every step is awaited in order; nothing runs concurrently.

use crate::config::ClientConfig;
use crate::engine::{AcquiredWallet, CryptoEngine, DkgOutcome, EngineError};
use crate::storage::WalletCache;
use crate::types::{AuthData, UserId, WalletRecord};
use crate::wallet::Wallet;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Token handed to the registration callbacks
pub const DEVICE_CODE: &str = "deviceCode";

/// Progress hook for device registration
pub type RegisterCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Optional observers for the device-registration fallback
///
/// Both hooks default to no-ops. They are synchronous and should return
/// promptly; registration does not wait on them beyond the call itself.
#[derive(Default)]
pub struct RegisterCallbacks {
    on_start: Option<RegisterCallback>,
    on_done: Option<RegisterCallback>,
}

impl RegisterCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the device code right before registration starts
    pub fn on_start(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(callback));
        self
    }

    /// Called with the device code after registration succeeded
    pub fn on_done(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_done = Some(Box::new(callback));
        self
    }

    fn started(&self, device_code: &str) {
        match &self.on_start {
            Some(callback) => callback(device_code),
            None => warn!("Device registration started without a start callback"),
        }
    }

    fn done(&self, device_code: &str) {
        match &self.on_done {
            Some(callback) => callback(device_code),
            None => warn!("Device registration finished without a done callback"),
        }
    }
}

impl fmt::Debug for RegisterCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_done", &self.on_done.is_some())
            .finish()
    }
}

/// Resolves authenticated users to wallet sessions
#[derive(Clone)]
pub struct WalletClient {
    config: ClientConfig,
    engine: Arc<dyn CryptoEngine>,
    cache: Arc<dyn WalletCache>,
}

impl WalletClient {
    pub fn new(
        config: ClientConfig,
        engine: Arc<dyn CryptoEngine>,
        cache: Arc<dyn WalletCache>,
    ) -> Self {
        Self {
            config,
            engine,
            cache,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Return the user's wallet, creating or registering one if needed
    ///
    /// A complete cached record wins over everything else and no further
    /// engine calls are made. Otherwise DKG runs; if the server reports that
    /// the wallet already exists, this device is registered against it.
    #[instrument(skip_all, fields(host = %self.config.host()))]
    pub async fn get_wallet(
        &self,
        auth_data: &AuthData,
        callbacks: &RegisterCallbacks,
    ) -> Result<Wallet> {
        require_auth_data(auth_data)?;

        let user_id = self
            .identify(auth_data)
            .await
            .inspect_err(|e| error!(error = %e, "GetWallet - error getting user id"))?;

        let key = self.config.cache_key(&user_id);
        if let Some(record) = self.cache.get(&key).await? {
            info!(user_id = %user_id, "GetWallet - loading existing wallet");
            return Ok(self.wallet_from_record(record, auth_data));
        }

        info!(user_id = %user_id, "GetWallet - starting DKG");
        match self.engine.dkg(self.config.host(), auth_data).await {
            DkgOutcome::Created(raw) => {
                let acquired = AcquiredWallet::parse(&raw).map_err(|e| {
                    error!(error = %e, "GetWallet - error while DKG");
                    Error::DkgFailed(e)
                })?;
                return self.persist(user_id, acquired, auth_data).await;
            }
            DkgOutcome::Conflict => {
                info!(
                    user_id = %user_id,
                    "GetWallet - wallet already exists on server side, registering device"
                );
            }
            DkgOutcome::Failed(e) => {
                error!(error = %e, "GetWallet - error while DKG");
                return Err(Error::DkgFailed(e));
            }
        }

        self.register_device(user_id, auth_data, callbacks).await
    }

    /// Restore the user's wallet from a backup artifact
    ///
    /// Always replaces whatever record is cached for the user.
    #[instrument(skip_all, fields(host = %self.config.host()))]
    pub async fn get_wallet_from_backup(
        &self,
        auth_data: &AuthData,
        backup: &str,
    ) -> Result<Wallet> {
        require_auth_data(auth_data)?;

        let user_id = self
            .identify(auth_data)
            .await
            .inspect_err(|e| error!(error = %e, "GetWalletFromBackup - error getting user id"))?;

        info!(user_id = %user_id, "GetWalletFromBackup - restoring wallet");
        let acquired = self
            .engine
            .from_backup(self.config.host(), backup, auth_data)
            .await
            .and_then(|raw| AcquiredWallet::parse(&raw))
            .map_err(|e| {
                error!(error = %e, "GetWalletFromBackup - error while restoring from backup");
                Error::BackupRestoreFailed(e)
            })?;

        self.persist(user_id, acquired, auth_data).await
    }

    async fn identify(&self, auth_data: &AuthData) -> Result<UserId> {
        let user_id = self
            .engine
            .identify(self.config.host(), auth_data)
            .await
            .map_err(Error::IdentifyFailed)?;

        if user_id.is_empty() {
            return Err(Error::IdentifyFailed(EngineError::new(
                "engine returned an empty user id",
            )));
        }

        debug!(user_id = %user_id, "Identified user");
        Ok(user_id)
    }

    async fn register_device(
        &self,
        user_id: UserId,
        auth_data: &AuthData,
        callbacks: &RegisterCallbacks,
    ) -> Result<Wallet> {
        callbacks.started(DEVICE_CODE);

        let acquired = self
            .engine
            .register_device(self.config.host(), auth_data)
            .await
            .and_then(|raw| AcquiredWallet::parse(&raw))
            .map_err(|e| {
                error!(error = %e, "GetWallet - error while registering device");
                Error::RegisterDeviceFailed(e)
            })?;

        let wallet = self.persist(user_id, acquired, auth_data).await?;
        callbacks.done(DEVICE_CODE);

        Ok(wallet)
    }

    /// Write the complete record, then hand out the wallet
    async fn persist(
        &self,
        user_id: UserId,
        acquired: AcquiredWallet,
        auth_data: &AuthData,
    ) -> Result<Wallet> {
        let key = self.config.cache_key(&user_id);
        let record = WalletRecord::new(
            user_id,
            acquired.share_material,
            acquired.address,
            acquired.metadata,
        );

        self.cache.put(&key, &record).await?;
        info!(key = %key, address = %record.address, "Stored wallet record");

        Ok(self.wallet_from_record(record, auth_data))
    }

    fn wallet_from_record(&self, record: WalletRecord, auth_data: &AuthData) -> Wallet {
        Wallet::new(
            self.config.host(),
            record.share_material,
            record.metadata,
            record.address,
            auth_data.clone(),
            Arc::clone(&self.engine),
        )
    }
}

impl fmt::Debug for WalletClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn require_auth_data(auth_data: &AuthData) -> Result<()> {
    if auth_data.is_empty() {
        return Err(Error::InvalidInput("authData is empty".into()));
    }
    Ok(())
}

//! Wallet operations
//!
//! A [`Wallet`] is the handle returned once a session has been resolved.
//! It is immutable; every operation is a single delegation to the
//! [`CryptoEngine`] with cheap local validation and output formatting.

use crate::engine::{CryptoEngine, EngineError, KeyContext};
use crate::types::{AuthData, Metadata, ShareMaterial};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Resolved wallet session
#[derive(Clone)]
pub struct Wallet {
    host: String,
    share_material: ShareMaterial,
    metadata: Option<Metadata>,
    address: String,
    auth_data: AuthData,
    engine: Arc<dyn CryptoEngine>,
}

impl Wallet {
    pub(crate) fn new(
        host: impl Into<String>,
        share_material: ShareMaterial,
        metadata: Option<Metadata>,
        address: impl Into<String>,
        auth_data: AuthData,
        engine: Arc<dyn CryptoEngine>,
    ) -> Self {
        Self {
            host: host.into(),
            share_material,
            metadata,
            address: address.into(),
            auth_data,
            engine,
        }
    }

    /// Address transactions from this wallet are sent from
    pub fn from(&self) -> &str {
        &self.address
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    fn keys(&self) -> KeyContext<'_> {
        KeyContext {
            share_material: &self.share_material,
            metadata: self.metadata.as_ref(),
            auth_data: &self.auth_data,
        }
    }

    fn operation_failed(operation: &'static str, source: EngineError) -> Error {
        error!(operation, error = %source, "Wallet operation failed");
        Error::EngineOperationFailed { operation, source }
    }

    /// Sign an Ethereum transaction described by JSON parameters
    ///
    /// Returns the `0x`-prefixed signed transaction.
    pub async fn sign_eth_transaction<T>(&self, tx_params: &T, chain_id: u64) -> Result<String>
    where
        T: Serialize + Sync + ?Sized,
    {
        let tx_params = serde_json::to_string(tx_params)
            .map_err(|e| Error::InvalidInput(format!("Unserializable transaction: {}", e)))?;

        debug!(chain_id, "Signing Ethereum transaction");
        let signed = self
            .engine
            .sign_eth_transaction(&self.host, &tx_params, self.keys(), &chain_id.to_string())
            .await
            .map_err(|e| Self::operation_failed("SignEthTransaction", e))?;

        Ok(format!("0x{}", signed))
    }

    /// Sign `0x`-prefixed hex data
    ///
    /// Input not matching `^0x[0-9a-fA-F]+$` is rejected without contacting
    /// the engine.
    pub async fn sign_bytes(&self, data: &str) -> Result<String> {
        if !is_prefixed_hex(data) {
            return Err(Error::InvalidInput(
                "Incorrect format. Requires hex encoded data.".into(),
            ));
        }

        let signature = self
            .engine
            .sign_bytes(&self.host, data, self.keys())
            .await
            .map_err(|e| Self::operation_failed("SignBytes", e))?;

        Ok(format!("0x{}", signature))
    }

    /// Reconstruct the private key from the client and server shares
    pub async fn export(&self) -> Result<String> {
        let private_key = self
            .engine
            .export(&self.host, self.keys())
            .await
            .map_err(|e| Self::operation_failed("Export", e))?;

        Ok(format!("0x{}", private_key))
    }

    /// Run the protocol that adds another device to this wallet
    pub async fn accept_device(&self) -> Result<()> {
        self.engine
            .accept_device(&self.host, self.keys())
            .await
            .map_err(|e| Self::operation_failed("AcceptDevice", e))
    }

    /// Run the protocol that adds a backup share; returns the backup verbatim
    pub async fn backup(&self) -> Result<String> {
        self.engine
            .backup(&self.host, self.keys())
            .await
            .map_err(|e| Self::operation_failed("Backup", e))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("host", &self.host)
            .field("address", &self.address)
            .field("metadata", &self.metadata)
            .field("share_material", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// `0x` followed by at least one hex digit
pub fn is_prefixed_hex(data: &str) -> bool {
    match data.strip_prefix("0x") {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

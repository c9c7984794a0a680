//! Crypto engine boundary
//!
//! The engine performs the actual threshold cryptography: DKG, signing,
//! share reconstruction and the interactive multi-device protocols. This
//! crate only orchestrates it through the [`CryptoEngine`] trait, which
//! exposes exactly the nine operations the session layer needs.
//!
//! Acquisition operations (`dkg`, `register_device`, `from_backup`) return
//! the engine's JSON response:
//!
//! ```text
//! {"dkgResult": {..., "Address": "0x..."}, "metadata": ...}
//! ```
//!
//! which [`AcquiredWallet::parse`] turns into typed session fields.

use crate::types::{AuthData, Metadata, ShareMaterial, UserId};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by the engine
///
/// The message is kept exactly as the engine reported it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Outcome of a DKG attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DkgOutcome {
    /// A fresh wallet was created; carries the acquisition JSON
    Created(String),
    /// A wallet already exists server-side for this user
    Conflict,
    /// DKG failed for any other reason
    Failed(EngineError),
}

/// Key material an engine operation needs to act on an existing wallet
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    pub share_material: &'a ShareMaterial,
    pub metadata: Option<&'a Metadata>,
    pub auth_data: &'a AuthData,
}

/// Crypto engine operations used by the session layer
///
/// Every operation is keyed by the server `host`. Implementations are
/// expected to run at most one interactive protocol per wallet at a time.
#[async_trait]
pub trait CryptoEngine: Send + Sync {
    /// Resolve auth data to a stable user id
    async fn identify(&self, host: &str, auth_data: &AuthData) -> EngineResult<UserId>;

    /// Run distributed key generation for a new wallet
    async fn dkg(&self, host: &str, auth_data: &AuthData) -> DkgOutcome;

    /// Obtain a share for an already provisioned wallet (interactive)
    async fn register_device(&self, host: &str, auth_data: &AuthData) -> EngineResult<String>;

    /// Rebuild a share from a backup artifact
    async fn from_backup(
        &self,
        host: &str,
        backup: &str,
        auth_data: &AuthData,
    ) -> EngineResult<String>;

    /// Sign an Ethereum transaction given as JSON parameters
    ///
    /// Returns the signed transaction as hex without a `0x` prefix.
    async fn sign_eth_transaction(
        &self,
        host: &str,
        tx_params: &str,
        keys: KeyContext<'_>,
        chain_id: &str,
    ) -> EngineResult<String>;

    /// Sign `0x`-prefixed hex data; returns hex without a prefix
    async fn sign_bytes(
        &self,
        host: &str,
        data: &str,
        keys: KeyContext<'_>,
    ) -> EngineResult<String>;

    /// Reconstruct the private key; returns hex without a prefix
    async fn export(&self, host: &str, keys: KeyContext<'_>) -> EngineResult<String>;

    /// Admit another device into the wallet (interactive)
    async fn accept_device(&self, host: &str, keys: KeyContext<'_>) -> EngineResult<()>;

    /// Produce an opaque backup artifact (interactive)
    async fn backup(&self, host: &str, keys: KeyContext<'_>) -> EngineResult<String>;
}

/// Session fields extracted from an acquisition response
#[derive(Debug, Clone)]
pub struct AcquiredWallet {
    pub share_material: ShareMaterial,
    pub address: String,
    pub metadata: Option<Metadata>,
}

#[derive(Deserialize)]
struct AcquisitionResponse {
    #[serde(rename = "dkgResult")]
    dkg_result: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
}

impl AcquiredWallet {
    /// Parse the JSON returned by `dkg`, `register_device` or `from_backup`
    ///
    /// The share material is the serialized `dkgResult` object. Metadata is
    /// taken verbatim when it is a JSON string, otherwise serialized; a
    /// missing or null `metadata` leaves it unset.
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let response: AcquisitionResponse = serde_json::from_str(raw)
            .map_err(|e| EngineError::new(format!("malformed engine response: {}", e)))?;

        let dkg_result = match response.dkg_result {
            Some(value @ Value::Object(_)) => value,
            _ => {
                return Err(EngineError::new(
                    "malformed engine response: missing dkgResult",
                ));
            }
        };

        let address = dkg_result
            .get("Address")
            .and_then(Value::as_str)
            .filter(|address| !address.is_empty())
            .ok_or_else(|| EngineError::new("malformed engine response: missing Address"))?
            .to_string();

        let metadata = match response.metadata {
            Some(Value::String(s)) => Some(Metadata::new(s)),
            Some(Value::Null) | None => None,
            Some(other) => Some(Metadata::new(other.to_string())),
        };

        Ok(Self {
            share_material: ShareMaterial::new(dkg_result.to_string()),
            address,
            metadata,
        })
    }
}

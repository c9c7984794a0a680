//! Core types for wallet sessions
//!
//! Credentials and key-share material are opaque strings as far as this
//! crate is concerned. Both carry redacting `Debug` impls so they cannot leak
//! through logging, and share material is zeroized on drop.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// User identifier returned by the engine's `identify` operation
pub type UserId = String;

/// Opaque credential payload forwarded to the engine
#[derive(Clone, PartialEq, Eq)]
pub struct AuthData(String);

impl AuthData {
    /// Wrap a credential payload
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw payload, for engine implementations
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for AuthData {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AuthData {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for AuthData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthData([REDACTED])")
    }
}

/// Serialized client key share (the engine's `dkgResult`)
///
/// Only ever handed back to engine calls for the user it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ShareMaterial(String);

impl ShareMaterial {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw serialized share, for engine implementations
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ShareMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareMaterial([REDACTED])")
    }
}

/// Opaque server-side wallet descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(String);

impl Metadata {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to rebuild a session without re-running DKG
///
/// Records are always written whole. `metadata` is unset when the engine
/// response carried none, and the field is then stored as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    /// Owner of the share
    pub user_id: UserId,
    /// Client key share
    pub share_material: ShareMaterial,
    /// Public wallet address
    pub address: String,
    /// Server-side wallet descriptor
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl WalletRecord {
    /// Create a complete record
    pub fn new(
        user_id: impl Into<UserId>,
        share_material: ShareMaterial,
        address: impl Into<String>,
        metadata: impl Into<Option<Metadata>>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            share_material,
            address: address.into(),
            metadata: metadata.into(),
        }
    }
}

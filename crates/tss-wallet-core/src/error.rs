//! Error types for wallet session operations

use crate::engine::EngineError;
use thiserror::Error;

/// Result type alias for wallet session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or using a wallet session
///
/// Engine failures are never translated: the phase variants carry the
/// [`EngineError`] exactly as the engine produced it.
#[derive(Debug, Error)]
pub enum Error {
    // ============ Input Errors ============
    /// Caller supplied an unusable argument (empty auth data, malformed hex)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ============ Acquisition Errors ============
    /// The engine could not resolve the auth data to a user id
    #[error("Identify failed: {0}")]
    IdentifyFailed(#[source] EngineError),

    /// Distributed key generation failed for a reason other than a conflict
    #[error("DKG failed: {0}")]
    DkgFailed(#[source] EngineError),

    /// Registering this device against an existing wallet failed
    #[error("Device registration failed: {0}")]
    RegisterDeviceFailed(#[source] EngineError),

    /// Restoring the key share from a backup failed
    #[error("Backup restore failed: {0}")]
    BackupRestoreFailed(#[source] EngineError),

    // ============ Wallet Operation Errors ============
    /// A signing, export or device operation failed inside the engine
    #[error("{operation} failed: {source}")]
    EngineOperationFailed {
        operation: &'static str,
        #[source]
        source: EngineError,
    },

    // ============ Storage Errors ============
    /// Wallet cache operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The unmodified engine error behind this failure, if any
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            Error::IdentifyFailed(e)
            | Error::DkgFailed(e)
            | Error::RegisterDeviceFailed(e)
            | Error::BackupRestoreFailed(e)
            | Error::EngineOperationFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

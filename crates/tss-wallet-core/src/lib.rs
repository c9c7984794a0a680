//! # TSS Wallet Core
//!
//! Client-side session layer for DKG / threshold-signature wallets.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Session Resolution**: [`WalletClient`] decides whether this device
//!   already holds a key share and otherwise runs DKG, falling back to
//!   device registration when the wallet exists server-side
//! - **Wallet Cache**: persistent per-user records of share material,
//!   address and metadata
//! - **Wallet Operations**: [`Wallet`] exposes signing, export, backup and
//!   device management on a resolved session
//! - **Engine Boundary**: [`CryptoEngine`], the nine asynchronous operations
//!   the threshold-crypto engine must provide
//!
//! The cryptography itself lives behind [`CryptoEngine`]; this crate never
//! inspects share material or credentials.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tss_wallet_core::{AuthData, ClientConfig, RegisterCallbacks, WalletClient};
//! use tss_wallet_core::storage::FileSystemWalletCache;
//!
//! let config = ClientConfig::new("https://wallet.example.com")?;
//! let cache = Arc::new(FileSystemWalletCache::new("/var/lib/tss-wallet")?);
//! let client = WalletClient::new(config, engine, cache);
//!
//! let callbacks = RegisterCallbacks::new()
//!     .on_start(|code| println!("approve this device: {code}"));
//! let wallet = client.get_wallet(&AuthData::new(token), &callbacks).await?;
//!
//! let signature = wallet.sign_bytes("0xdeadbeef").await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod storage;
pub mod types;
pub mod wallet;

pub use config::ClientConfig;
pub use engine::{
    AcquiredWallet, CryptoEngine, DkgOutcome, EngineError, EngineResult, KeyContext,
};
pub use error::{Error, Result};
pub use session::{DEVICE_CODE, RegisterCallback, RegisterCallbacks, WalletClient};
pub use storage::{CacheKey, MemoryWalletCache, WalletCache};
pub use types::{AuthData, Metadata, ShareMaterial, UserId, WalletRecord};
pub use wallet::Wallet;

#[cfg(feature = "runtime")]
pub use storage::FileSystemWalletCache;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Wallet Cache
//!
//! Persists the [`WalletRecord`] for each user so that a session can be
//! rebuilt without re-running DKG. Records are addressed by a structured
//! [`CacheKey`] and are always written as one unit.
//!
//! - **MemoryWalletCache**: process-local map (testing, ephemeral sessions)
//! - **FileSystemWalletCache**: one JSON file per record (`runtime` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tss_wallet_core::storage::{CacheKey, FileSystemWalletCache, WalletCache};
//!
//! let cache = FileSystemWalletCache::new("/var/lib/tss-wallet")?;
//! let key = CacheKey::new("tss-wallet", "user-1");
//!
//! if let Some(record) = cache.get(&key).await? {
//!     println!("cached wallet {}", record.address);
//! }
//! ```

use crate::types::{UserId, WalletRecord};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "runtime")]
pub use fs::{FileSystemWalletCache, RecordSummary};

/// Location of one user's record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Partition owned by one client configuration
    pub namespace: String,
    /// Owner of the record
    pub user_id: UserId,
}

impl CacheKey {
    pub fn new(namespace: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        Self {
            namespace: namespace.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.user_id)
    }
}

/// Trait for wallet cache backends
#[async_trait]
pub trait WalletCache: Send + Sync {
    /// Load the record for a user
    ///
    /// Entries missing share material or address read as absent.
    async fn get(&self, key: &CacheKey) -> Result<Option<WalletRecord>>;

    /// Store a complete record, replacing any previous one
    async fn put(&self, key: &CacheKey, record: &WalletRecord) -> Result<()>;

    /// Delete a record; returns whether one existed
    async fn remove(&self, key: &CacheKey) -> Result<bool>;

    /// List user ids with a record in the namespace
    async fn list(&self, namespace: &str) -> Result<Vec<UserId>>;
}

/// In-memory cache
#[derive(Debug, Clone, Default)]
pub struct MemoryWalletCache {
    records: Arc<RwLock<HashMap<CacheKey, WalletRecord>>>,
}

impl MemoryWalletCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletCache for MemoryWalletCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<WalletRecord>> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, record: &WalletRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(key.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let mut records = self.records.write().await;
        Ok(records.remove(key).is_some())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<UserId>> {
        let records = self.records.read().await;
        let mut ids: Vec<UserId> = records
            .keys()
            .filter(|key| key.namespace == namespace)
            .map(|key| key.user_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(feature = "runtime")]
mod fs {
    use super::{CacheKey, WalletCache};
    use crate::config::validate_namespace;
    use crate::types::{Metadata, ShareMaterial, UserId, WalletRecord};
    use crate::{Error, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use sha2::{Digest, Sha256};
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};
    use tokio::io::AsyncWriteExt;
    use tracing::warn;

    const RECORD_EXTENSION: &str = "json";
    const TEMP_EXTENSION: &str = "json.tmp";

    /// On-disk form of a record
    ///
    /// Every field is optional so that damaged entries can still be
    /// inspected; [`WalletCache::get`] only returns complete ones.
    #[derive(Serialize, Deserialize)]
    struct StoredRecord {
        user_id: UserId,
        #[serde(default)]
        share_material: Option<ShareMaterial>,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        metadata: Option<Metadata>,
        stored_at: DateTime<Utc>,
    }

    /// Non-secret view of a stored record
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordSummary {
        pub user_id: UserId,
        pub address: Option<String>,
        pub metadata: Option<Metadata>,
        pub has_share_material: bool,
        pub stored_at: DateTime<Utc>,
    }

    impl RecordSummary {
        /// Whether the record can be turned into a wallet session
        pub fn is_complete(&self) -> bool {
            self.has_share_material && self.address.is_some()
        }
    }

    /// File stem for a user's record: hex SHA-256 of the user id
    ///
    /// Fixed length regardless of the id, and free of path syntax.
    pub(super) fn record_stem(user_id: &str) -> String {
        hex::encode(Sha256::digest(user_id.as_bytes()))
    }

    /// Removes the temporary file unless the write completed
    struct TempFile {
        path: PathBuf,
        committed: bool,
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            if !self.committed {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    /// Filesystem cache
    ///
    /// Layout: `<base>/<namespace>/<sha256(user_id)>.json`, with the user id
    /// stored inside the record. Writes go to an owner-only temporary file
    /// that is renamed over the record, so a crash never leaves a partially
    /// written record behind. Unreadable records are skipped with a warning.
    #[derive(Debug, Clone)]
    pub struct FileSystemWalletCache {
        base_path: PathBuf,
    }

    impl FileSystemWalletCache {
        /// Create a cache rooted at `base_path`, creating the directory
        pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
            let base_path = base_path.into();

            if !base_path.exists() {
                std::fs::create_dir_all(&base_path)?;
            }

            Ok(Self { base_path })
        }

        pub fn base_path(&self) -> &Path {
            &self.base_path
        }

        fn namespace_dir(&self, namespace: &str) -> Result<PathBuf> {
            validate_namespace(namespace)?;
            Ok(self.base_path.join(namespace))
        }

        fn record_path(&self, key: &CacheKey) -> Result<PathBuf> {
            if key.user_id.is_empty() {
                return Err(Error::Storage("User id must not be empty".into()));
            }
            let dir = self.namespace_dir(&key.namespace)?;
            Ok(dir.join(format!("{}.{}", record_stem(&key.user_id), RECORD_EXTENSION)))
        }

        async fn read_file(path: &Path) -> Result<Option<StoredRecord>> {
            let data = match tokio::fs::read(path).await {
                Ok(data) => data,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            match serde_json::from_slice(&data) {
                Ok(stored) => Ok(Some(stored)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable wallet record");
                    Ok(None)
                }
            }
        }

        async fn read_stored(&self, key: &CacheKey) -> Result<Option<StoredRecord>> {
            let path = self.record_path(key)?;
            let stored = Self::read_file(&path).await?;

            // Only a record stored under this exact user id is returned
            Ok(stored.filter(|stored| {
                let matches = stored.user_id == key.user_id;
                if !matches {
                    warn!(key = %key, "Ignoring wallet record stored for another user");
                }
                matches
            }))
        }

        /// Describe a stored record without exposing its share material
        pub async fn describe(&self, key: &CacheKey) -> Result<Option<RecordSummary>> {
            Ok(self.read_stored(key).await?.map(|stored| RecordSummary {
                has_share_material: stored.share_material.is_some(),
                user_id: stored.user_id,
                address: stored.address,
                metadata: stored.metadata,
                stored_at: stored.stored_at,
            }))
        }

        /// Delete temporary files left behind by interrupted writes
        ///
        /// Returns the number of files removed.
        pub async fn purge_temp_files(&self, namespace: &str) -> Result<usize> {
            let dir = self.namespace_dir(namespace)?;

            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
                Err(e) => return Err(e.into()),
            };

            let suffix = format!(".{}", TEMP_EXTENSION);
            let mut removed = 0;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name();
                if !name.to_string_lossy().ends_with(&suffix) {
                    continue;
                }
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }

            Ok(removed)
        }

        async fn write_temp(path: &Path, data: &[u8]) -> Result<()> {
            // Start from a fresh file so the mode below applies
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            let mut options = tokio::fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            Ok(())
        }
    }

    #[async_trait]
    impl WalletCache for FileSystemWalletCache {
        async fn get(&self, key: &CacheKey) -> Result<Option<WalletRecord>> {
            let Some(stored) = self.read_stored(key).await? else {
                return Ok(None);
            };

            match (stored.share_material, stored.address) {
                (Some(share_material), Some(address)) => Ok(Some(WalletRecord {
                    user_id: stored.user_id,
                    share_material,
                    address,
                    metadata: stored.metadata,
                })),
                _ => {
                    warn!(key = %key, "Ignoring incomplete wallet record");
                    Ok(None)
                }
            }
        }

        async fn put(&self, key: &CacheKey, record: &WalletRecord) -> Result<()> {
            let path = self.record_path(key)?;
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }

            let stored = StoredRecord {
                user_id: key.user_id.clone(),
                share_material: Some(record.share_material.clone()),
                address: Some(record.address.clone()),
                metadata: record.metadata.clone(),
                stored_at: Utc::now(),
            };
            let data = serde_json::to_vec_pretty(&stored)?;

            let mut tmp = TempFile {
                path: path.with_extension(TEMP_EXTENSION),
                committed: false,
            };
            Self::write_temp(&tmp.path, &data).await?;
            tokio::fs::rename(&tmp.path, &path).await?;
            tmp.committed = true;

            Ok(())
        }

        async fn remove(&self, key: &CacheKey) -> Result<bool> {
            let path = self.record_path(key)?;

            match tokio::fs::remove_file(path.with_extension(TEMP_EXTENSION)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        }

        async fn list(&self, namespace: &str) -> Result<Vec<UserId>> {
            let dir = self.namespace_dir(namespace)?;

            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(e.into()),
            };

            let mut ids = Vec::new();
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some(RECORD_EXTENSION) {
                    continue;
                }
                if let Some(stored) = Self::read_file(&path).await? {
                    ids.push(stored.user_id);
                }
            }

            ids.sort();
            Ok(ids)
        }
    }
}

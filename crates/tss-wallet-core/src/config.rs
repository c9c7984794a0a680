//! Client configuration

use crate::storage::CacheKey;
use crate::{Error, Result};
use url::Url;

/// Cache namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "tss-wallet";

/// Configuration for a [`WalletClient`](crate::WalletClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host passed to every engine operation
    host: String,
    /// Partition of the wallet cache owned by this client
    namespace: String,
}

impl ClientConfig {
    /// Create a config for the given server URL
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        let url = Url::parse(&host)
            .map_err(|e| Error::InvalidConfig(format!("Invalid host {}: {}", host, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "Host must use http or https, got {}",
                url.scheme()
            )));
        }

        Ok(Self {
            host,
            namespace: DEFAULT_NAMESPACE.to_string(),
        })
    }

    /// Set the cache namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_namespace(&namespace)?;
        self.namespace = namespace;
        Ok(self)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cache key for a user in this client's namespace
    pub fn cache_key(&self, user_id: &str) -> CacheKey {
        CacheKey::new(&self.namespace, user_id)
    }
}

/// Check that a namespace is non-empty and limited to `[A-Za-z0-9_-]`
///
/// Namespaces become directory names in the filesystem cache.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(Error::InvalidConfig("Namespace must not be empty".into()));
    }
    if !namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidConfig(format!(
            "Namespace may only contain letters, digits, '-' and '_': {}",
            namespace
        )));
    }
    Ok(())
}

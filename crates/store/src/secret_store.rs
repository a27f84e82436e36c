//! The key→secret lookup abstraction the resolver works against.
//!
//! Backends are expected to be layered configuration sources: plain config
//! files, environment variables, or a secured credential store. Lookups may
//! block; resolution only happens during store-handle initialization.

use std::collections::HashMap;

use thiserror::Error;

/// A fault raised by a secret store backend.
///
/// Distinct from "key not present": a backend that cannot be read at all
/// (e.g. a corrupt or unreachable credential store) fails with this, and the
/// resolver wraps it with the offending key name.
#[derive(Debug, Clone, Error)]
pub enum SecretStoreError {
    /// The backing store failed while looking up a key.
    #[error("secret store lookup failed: {0}")]
    Lookup(String),
}

/// Key→secret lookup over a dotted configuration namespace.
///
/// `Ok(None)` means the key is simply not set; `Err` means the backend
/// itself failed. The resolver treats the two very differently.
#[cfg_attr(test, mockall::automock)]
pub trait SecretStore {
    /// Fetch the raw value for `key`, if any.
    fn get_secret(&self, key: &str) -> Result<Option<String>, SecretStoreError>;
}

/// [`SecretStore`] backed by a layered [`config::Config`].
///
/// This is the production backend: callers assemble whatever source stack
/// they need (files, environment) with the `config` crate's builder and
/// hand over the built configuration.
pub struct ConfigSecretStore {
    config: config::Config,
}

impl ConfigSecretStore {
    /// Wrap a built configuration.
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }
}

impl SecretStore for ConfigSecretStore {
    fn get_secret(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        match self.config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(SecretStoreError::Lookup(e.to_string())),
        }
    }
}

/// In-memory [`SecretStore`], for tests and for embedding callers that
/// already hold their settings as a plain map.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        Ok(self.values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_returns_set_values() {
        let store = MemorySecretStore::new().set("fs.s3a.secret", "s3kr1t");
        assert_eq!(
            store.get_secret("fs.s3a.secret").unwrap(),
            Some("s3kr1t".to_owned())
        );
        assert_eq!(store.get_secret("fs.s3a.other").unwrap(), None);
    }

    #[test]
    fn config_store_distinguishes_missing_from_set() {
        let config = config::Config::builder()
            .set_override("fs.s3a.server-side-encryption-algorithm", "SSE-KMS")
            .unwrap()
            .build()
            .unwrap();
        let store = ConfigSecretStore::new(config);

        assert_eq!(
            store
                .get_secret("fs.s3a.server-side-encryption-algorithm")
                .unwrap(),
            Some("SSE-KMS".to_owned())
        );
        assert_eq!(store.get_secret("fs.s3a.not-set").unwrap(), None);
    }
}

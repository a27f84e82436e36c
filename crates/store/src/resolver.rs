//! Layered secret resolution with per-bucket overrides.
//!
//! Every option lives under the global `fs.s3a.` namespace and can be
//! overridden for a single bucket under `fs.s3a.bucket.<bucket>.`. The
//! bucket-scoped form comes in two legacy spellings, both supported:
//!
//! - short: `fs.s3a.bucket.<bucket>.<subkey>`
//! - long:  `fs.s3a.bucket.<bucket>.fs.s3a.<subkey>`
//!
//! Precedence, highest first: explicit override, short bucket key, long
//! bucket key, global key, default.

use thiserror::Error;
use tracing::error;

use crate::secret_store::{SecretStore, SecretStoreError};

/// Global namespace prefix every base key must carry.
pub const FS_S3A_PREFIX: &str = "fs.s3a.";

/// Prefix of the bucket-scoped key forms.
pub const FS_S3A_BUCKET_PREFIX: &str = "fs.s3a.bucket.";

/// Option naming the server-side-encryption algorithm.
pub const SERVER_SIDE_ENCRYPTION_ALGORITHM: &str = "fs.s3a.server-side-encryption-algorithm";

/// Option naming the server-side-encryption key.
pub const SERVER_SIDE_ENCRYPTION_KEY: &str = "fs.s3a.server-side-encryption.key";

/// Errors from secret resolution and encryption policy validation.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The base key is outside the recognized namespace.
    #[error("configuration key {key} does not start with {FS_S3A_PREFIX}")]
    InvalidBaseKey {
        /// The offending base key.
        key: String,
    },

    /// The secret store failed while resolving a key.
    #[error("cannot retrieve secret option {key}")]
    SecretStore {
        /// The key whose lookup failed.
        key: String,
        #[source]
        source: SecretStoreError,
    },

    /// SSE-C is configured but no encryption key was declared.
    #[error("SSE-C is enabled but no encryption key was declared in {SERVER_SIDE_ENCRYPTION_KEY}")]
    SseCNoKey,

    /// SSE-S3 is configured and an encryption key was declared; the store
    /// manages keys for this mode, so a configured key is an inconsistency.
    #[error("AES256 is enabled but an encryption key was set in {SERVER_SIDE_ENCRYPTION_KEY} ({diagnostics})")]
    SseS3WithKey {
        /// Redacted description of the offending key.
        diagnostics: String,
    },
}

/// Resolve a secret, handling both the global key and the bucket overrides.
///
/// `override_val`, when non-empty, short-circuits every configured value.
/// With a non-empty `bucket`, the short bucket form wins over the long one,
/// and either wins over the global key. Whatever the path, an unset option
/// resolves to `default_val`.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidBaseKey`] if `base_key` is outside the
/// `fs.s3a.` namespace, or [`PolicyError::SecretStore`] if the store faults
/// on any of the consulted keys.
pub fn resolve_secret(
    store: &dyn SecretStore,
    bucket: &str,
    base_key: &str,
    override_val: &str,
    default_val: &str,
) -> Result<String, PolicyError> {
    let Some(subkey) = base_key.strip_prefix(FS_S3A_PREFIX) else {
        return Err(PolicyError::InvalidBaseKey {
            key: base_key.to_owned(),
        });
    };

    let current = if !bucket.is_empty() {
        let short_key = format!("{FS_S3A_BUCKET_PREFIX}{bucket}.{subkey}");
        let long_key = format!("{FS_S3A_BUCKET_PREFIX}{bucket}.{base_key}");

        // Short form first: when both bucket forms are set, it wins.
        let current = value_or_lookup(store, &short_key, override_val, "")?;
        value_or_lookup(store, &long_key, &current, "")?
    } else {
        // No bucket: the override value seeds the resolution directly.
        override_val.to_owned()
    };

    value_or_lookup(store, base_key, &current, default_val)
}

/// Resolve the server-side-encryption key, downgrading store faults to `""`.
///
/// This is deliberately lenient where everything else in this module is
/// strict: a fault reading the key is logged and treated as "no key
/// configured" rather than failing the mount. See DESIGN.md.
pub fn encryption_key(store: &dyn SecretStore, bucket: &str) -> String {
    match resolve_secret(store, bucket, SERVER_SIDE_ENCRYPTION_KEY, "", "") {
        Ok(key) => key,
        Err(e) => {
            error!(
                key = SERVER_SIDE_ENCRYPTION_KEY,
                error = %e,
                "cannot retrieve encryption key, continuing without one"
            );
            String::new()
        }
    }
}

/// Keep `current` if it is already set, otherwise look `key` up, falling
/// back to `default_val` when the option is absent.
fn value_or_lookup(
    store: &dyn SecretStore,
    key: &str,
    current: &str,
    default_val: &str,
) -> Result<String, PolicyError> {
    if current.is_empty() {
        lookup(store, key, default_val)
    } else {
        Ok(current.to_owned())
    }
}

fn lookup(store: &dyn SecretStore, key: &str, default_val: &str) -> Result<String, PolicyError> {
    match store.get_secret(key) {
        Ok(Some(value)) => Ok(value.trim().to_owned()),
        Ok(None) => Ok(default_val.to_owned()),
        Err(source) => Err(PolicyError::SecretStore {
            key: key.to_owned(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret_store::{MemorySecretStore, MockSecretStore};

    const BASE: &str = "fs.s3a.server-side-encryption.key";

    #[test]
    fn rejects_key_outside_namespace() {
        let store = MemorySecretStore::new();
        let err = resolve_secret(&store, "", "fs.gs.key", "", "").unwrap_err();
        assert!(matches!(err, PolicyError::InvalidBaseKey { .. }));
    }

    #[test]
    fn default_when_nothing_is_set() {
        let store = MemorySecretStore::new();
        let v = resolve_secret(&store, "b", BASE, "", "fallback").unwrap();
        assert_eq!(v, "fallback");
    }

    #[test]
    fn global_key_applies_with_and_without_bucket() {
        let store = MemorySecretStore::new().set(BASE, "global");
        assert_eq!(resolve_secret(&store, "", BASE, "", "").unwrap(), "global");
        assert_eq!(resolve_secret(&store, "b", BASE, "", "").unwrap(), "global");
    }

    #[test]
    fn long_bucket_key_overrides_global() {
        let store = MemorySecretStore::new()
            .set(BASE, "global")
            .set(format!("fs.s3a.bucket.b.{BASE}"), "long");
        assert_eq!(resolve_secret(&store, "b", BASE, "", "").unwrap(), "long");
        // A different bucket still sees the global value.
        assert_eq!(resolve_secret(&store, "c", BASE, "", "").unwrap(), "global");
    }

    #[test]
    fn short_bucket_key_wins_over_long() {
        let store = MemorySecretStore::new()
            .set(BASE, "global")
            .set(format!("fs.s3a.bucket.b.{BASE}"), "long")
            .set("fs.s3a.bucket.b.server-side-encryption.key", "short");
        assert_eq!(resolve_secret(&store, "b", BASE, "", "").unwrap(), "short");
    }

    #[test]
    fn override_beats_every_configured_value() {
        let store = MemorySecretStore::new()
            .set(BASE, "global")
            .set(format!("fs.s3a.bucket.b.{BASE}"), "long")
            .set("fs.s3a.bucket.b.server-side-encryption.key", "short");
        assert_eq!(
            resolve_secret(&store, "b", BASE, "forced", "").unwrap(),
            "forced"
        );
        assert_eq!(
            resolve_secret(&store, "", BASE, "forced", "").unwrap(),
            "forced"
        );
    }

    #[test]
    fn values_are_trimmed() {
        let store = MemorySecretStore::new().set(BASE, "  padded \n");
        assert_eq!(resolve_secret(&store, "", BASE, "", "").unwrap(), "padded");
    }

    #[test]
    fn store_fault_is_wrapped_with_key_name() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .returning(|_| Err(SecretStoreError::Lookup("keystore unreadable".into())));
        let err = resolve_secret(&store, "", BASE, "", "").unwrap_err();
        match err {
            PolicyError::SecretStore { key, .. } => assert_eq!(key, BASE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encryption_key_swallows_store_faults() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .returning(|_| Err(SecretStoreError::Lookup("keystore unreadable".into())));
        assert_eq!(encryption_key(&store, "b"), "");
    }

    #[test]
    fn encryption_key_resolves_like_any_secret() {
        let store = MemorySecretStore::new().set(SERVER_SIDE_ENCRYPTION_KEY, "abc123");
        assert_eq!(encryption_key(&store, ""), "abc123");
    }
}

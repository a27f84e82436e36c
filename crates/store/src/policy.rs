//! Encryption policy resolution: algorithm + key → validated settings.

use sse_secrets::{EncryptionMethod, EncryptionSecrets};
use tracing::debug;

use crate::resolver::{
    encryption_key, resolve_secret, PolicyError, SERVER_SIDE_ENCRYPTION_ALGORITHM,
};
use crate::secret_store::SecretStore;

/// Resolve and validate the encryption method for `bucket`.
///
/// The algorithm and key are each resolved through the layered lookup in
/// [`crate::resolver`], then checked for consistency:
///
/// - `SSE-C` requires a key.
/// - `SSE-S3` forbids one (the store manages the keys).
/// - `SSE-KMS` takes an optional key id; absent means the storage-default
///   master key.
///
/// # Errors
///
/// Returns [`PolicyError::SseCNoKey`] / [`PolicyError::SseS3WithKey`] on an
/// inconsistent combination, or any resolution error for the algorithm
/// option itself.
pub fn resolve_encryption_method(
    store: &dyn SecretStore,
    bucket: &str,
) -> Result<EncryptionMethod, PolicyError> {
    let algorithm = resolve_secret(store, bucket, SERVER_SIDE_ENCRYPTION_ALGORITHM, "", "")?;
    let method = EncryptionMethod::from_algorithm(&algorithm);
    let key = encryption_key(store, bucket);
    let diagnostics = secret_diagnostics(&key, "key");

    match method {
        EncryptionMethod::SseC => {
            debug!(%diagnostics, "using SSE-C");
            if key.is_empty() {
                return Err(PolicyError::SseCNoKey);
            }
        }
        EncryptionMethod::SseS3 => {
            if !key.is_empty() {
                return Err(PolicyError::SseS3WithKey { diagnostics });
            }
        }
        EncryptionMethod::SseKms => {
            debug!(%diagnostics, "using SSE-KMS");
        }
        EncryptionMethod::None => {
            debug!("data is unencrypted");
        }
    }
    Ok(method)
}

/// Resolve the full [`EncryptionSecrets`] for `bucket`.
///
/// This is the value built once per store handle at initialization and
/// shared read-only by every subsequent copy.
///
/// # Errors
///
/// Same failure modes as [`resolve_encryption_method`].
pub fn resolve_encryption_secrets(
    store: &dyn SecretStore,
    bucket: &str,
) -> Result<EncryptionSecrets, PolicyError> {
    let method = resolve_encryption_method(store, bucket)?;
    Ok(EncryptionSecrets::new(method, encryption_key(store, bucket)))
}

/// Describe a secret for diagnostics without revealing it.
///
/// Renders as `"empty <desc>"`, `"<desc> of length 1"`, or
/// `"<desc> of length N ending with <last-char>"`.
pub fn secret_diagnostics(value: &str, desc: &str) -> String {
    let len = value.chars().count();
    match len {
        0 => format!("empty {desc}"),
        1 => format!("{desc} of length 1"),
        _ => {
            let last = value.chars().last().unwrap_or_default();
            format!("{desc} of length {len} ending with {last}")
        }
    }
}

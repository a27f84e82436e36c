//! The closed set of S3 server-side-encryption modes.

use serde::{Deserialize, Serialize};

/// S3 server-side-encryption mode.
///
/// This is always derived from the configured algorithm name via
/// [`EncryptionMethod::from_algorithm`]; it is never set or persisted
/// directly. Every consumer matches on it exhaustively so that adding a
/// fifth mode is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncryptionMethod {
    /// No server-side encryption configured.
    #[default]
    None,
    /// SSE-S3: keys managed entirely by the store (`AES256`).
    SseS3,
    /// SSE-C: customer-supplied key, presented on every request.
    SseC,
    /// SSE-KMS: key managed by the key-management service, identified by an
    /// optional key id.
    SseKms,
}

impl EncryptionMethod {
    /// Map a configured algorithm name to a method.
    ///
    /// Accepts the canonical spellings plus their common aliases. An empty
    /// or unrecognized name maps to [`EncryptionMethod::None`] rather than
    /// failing: configuration validation happens later, once both the
    /// algorithm and the key are known.
    pub fn from_algorithm(algorithm: &str) -> Self {
        match algorithm.trim() {
            "AES256" | "SSE-S3" => EncryptionMethod::SseS3,
            "SSE-KMS" | "aws:kms" => EncryptionMethod::SseKms,
            "SSE-C" => EncryptionMethod::SseC,
            _ => EncryptionMethod::None,
        }
    }

    /// The canonical configuration spelling of this method.
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMethod::None => "",
            EncryptionMethod::SseS3 => "AES256",
            EncryptionMethod::SseKms => "SSE-KMS",
            EncryptionMethod::SseC => "SSE-C",
        }
    }
}

impl std::fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

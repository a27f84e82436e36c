//! [`EncryptionSecrets`]: the resolved encryption settings for one store.
//!
//! Maintainers: for security reasons, never print the key. `Debug`,
//! `Display` and the tracing call sites in dependent crates all go out of
//! their way to keep it out of logs.

use serde::{Deserialize, Serialize};

use crate::method::EncryptionMethod;

/// An immutable `(algorithm, key)` pair plus the method derived from the
/// algorithm name.
///
/// Built once per store handle at initialization, or reconstructed from the
/// wire format in [`crate::wire`]. The `method` field is never serialized in
/// any form; it is rebuilt from `algorithm` on every deserialization path,
/// so the invariant `method == EncryptionMethod::from_algorithm(&algorithm)`
/// holds for every reachable value.
#[derive(Clone, Serialize)]
pub struct EncryptionSecrets {
    /// Algorithm name; must be one of the names understood by
    /// [`EncryptionMethod::from_algorithm`] to have any effect.
    algorithm: String,

    /// Encryption key or key reference. Possibly sensitive.
    key: String,

    #[serde(skip_serializing)]
    method: EncryptionMethod,
}

impl EncryptionSecrets {
    /// Build from an already-mapped method and a key.
    pub fn new(method: EncryptionMethod, key: impl Into<String>) -> Self {
        Self {
            algorithm: method.as_str().to_owned(),
            key: key.into(),
            method,
        }
    }

    /// Build from a raw algorithm name and key, deriving the method.
    pub fn from_parts(algorithm: impl Into<String>, key: impl Into<String>) -> Self {
        let algorithm = algorithm.into();
        let method = EncryptionMethod::from_algorithm(&algorithm);
        Self {
            algorithm,
            key: key.into(),
            method,
        }
    }

    /// The configured algorithm name; possibly empty.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The configured key or key reference; possibly empty.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The encryption method derived from the algorithm name.
    pub fn method(&self) -> EncryptionMethod {
        self.method
    }

    /// `true` if an algorithm name is set.
    pub fn has_algorithm(&self) -> bool {
        !self.algorithm.is_empty()
    }

    /// `true` if a key is set.
    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }
}

/// Declares "no encryption"; the state of a store handle before (or without)
/// initialization from configuration.
impl Default for EncryptionSecrets {
    fn default() -> Self {
        Self::new(EncryptionMethod::None, "")
    }
}

/// Equality is over `(algorithm, key)` only; `method` is derived state.
impl PartialEq for EncryptionSecrets {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm && self.key == other.key
    }
}

impl Eq for EncryptionSecrets {}

impl std::hash::Hash for EncryptionSecrets {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.algorithm.hash(state);
        self.key.hash(state);
    }
}

impl std::fmt::Debug for EncryptionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionSecrets")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .field("method", &self.method)
            .finish()
    }
}

/// Renders the encryption mode and nothing else; safe for logging.
impl std::fmt::Display for EncryptionSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.method {
            EncryptionMethod::None => f.write_str("(no encryption)"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for EncryptionSecrets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            algorithm: String,
            key: String,
        }

        // Re-derive `method` so the invariant holds after deserialization.
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self::from_parts(raw.algorithm, raw.key))
    }
}

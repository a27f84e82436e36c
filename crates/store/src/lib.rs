//! Server-side-encryption policy for S3 copy operations.
//!
//! S3 `CopyObject` re-encrypts server-side: unless the request carries
//! explicit encryption parameters, the copied object falls back to the
//! provider default and silently loses the source object's SSE settings.
//! This crate resolves the configured policy once per store handle and, at
//! copy time, computes the exact parameters to attach to the request:
//!
//! 1. [`secret_store`] — the key→secret lookup abstraction plus `config`
//!    and in-memory backends.
//! 2. [`resolver`] — layered lookup with per-bucket overrides.
//! 3. [`policy`] — algorithm/key validation producing
//!    [`sse_secrets::EncryptionSecrets`].
//! 4. [`copy`] — the copy-time parameter selection and its application to
//!    an [`aws_sdk_s3`] copy request.
//! 5. [`store`] — [`SseObjectStore`], a thin composition wrapper over
//!    [`aws_sdk_s3::Client`] wiring the above together.

pub mod copy;
pub mod policy;
pub mod resolver;
pub mod secret_store;
pub mod store;

pub use copy::{
    select_copy_encryption_params, CopyEncryptionParams, CustomerKey, KmsKeyParams,
    SourceObjectMetadata,
};
pub use policy::{resolve_encryption_method, resolve_encryption_secrets, secret_diagnostics};
pub use resolver::{encryption_key, resolve_secret, PolicyError};
pub use secret_store::{ConfigSecretStore, MemorySecretStore, SecretStore, SecretStoreError};
pub use store::{SseObjectStore, StoreError};

//! [`SseObjectStore`]: a copy-capable handle over one bucket.
//!
//! Composition instead of subclassing the SDK client: the handle owns an
//! [`aws_sdk_s3::Client`] plus the [`EncryptionSecrets`] resolved once at
//! open time, and layers the encryption-aware copy on top.

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::copy_object::CopyObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use sse_secrets::{EncryptionMethod, EncryptionSecrets};
use thiserror::Error;
use tracing::{debug, info};

use crate::copy::{select_copy_encryption_params, SourceObjectMetadata};
use crate::policy::resolve_encryption_secrets;
use crate::resolver::PolicyError;
use crate::secret_store::SecretStore;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Policy resolution failed; the handle cannot be opened.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Fetching the source object's metadata failed.
    #[error("cannot fetch object metadata for {bucket}/{key}")]
    Metadata {
        /// Bucket the object lives in.
        bucket: String,
        /// Object key.
        key: String,
        #[source]
        source: SdkError<HeadObjectError>,
    },

    /// The copy request itself failed.
    #[error("copy {source_key} -> {dest_key} in {bucket} failed")]
    Copy {
        /// Bucket the copy runs within.
        bucket: String,
        /// Source object key.
        source_key: String,
        /// Destination object key.
        dest_key: String,
        #[source]
        source: SdkError<CopyObjectError>,
    },
}

/// A bucket handle that carries its resolved encryption policy.
///
/// The secrets are resolved once in [`SseObjectStore::open`] and never
/// mutated afterwards; the handle is cheap to clone and safe to share
/// across any number of concurrent copies.
#[derive(Debug, Clone)]
pub struct SseObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    secrets: EncryptionSecrets,
}

impl SseObjectStore {
    /// Open a handle for `bucket`, resolving its encryption policy.
    ///
    /// # Errors
    ///
    /// Fails fast with [`StoreError::Policy`] if the configured algorithm
    /// and key are inconsistent; a handle with a half-valid policy is never
    /// produced.
    pub fn open(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        secret_store: &dyn SecretStore,
    ) -> Result<Self, StoreError> {
        let bucket = bucket.into();
        let secrets = resolve_encryption_secrets(secret_store, &bucket)?;
        info!(bucket = %bucket, encryption = %secrets, "opened object store handle");
        Ok(Self {
            client,
            bucket,
            secrets,
        })
    }

    /// Build a handle from already-resolved secrets, e.g. ones propagated
    /// from another process via the wire format. The caller is responsible
    /// for having validated them in its own policy context.
    pub fn with_secrets(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        secrets: EncryptionSecrets,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            secrets,
        }
    }

    /// The bucket this handle operates on.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The resolved encryption settings.
    pub fn secrets(&self) -> &EncryptionSecrets {
        &self.secrets
    }

    /// The resolved encryption method.
    pub fn encryption_method(&self) -> EncryptionMethod {
        self.secrets.method()
    }

    /// Fetch the copy-relevant metadata of one object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Metadata`] on any fetch failure; retries and
    /// backoff are the SDK's concern, not ours.
    pub async fn source_metadata(&self, key: &str) -> Result<SourceObjectMetadata, StoreError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|source| StoreError::Metadata {
                bucket: self.bucket.clone(),
                key: key.to_owned(),
                source,
            })?;
        Ok(SourceObjectMetadata::from(&head))
    }

    /// Server-side copy of `source_key` to `dest_key` within the bucket,
    /// carrying the encryption parameters this handle's policy selects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Metadata`] if the source metadata fetch fails,
    /// [`StoreError::Copy`] if the copy itself does.
    pub async fn copy_object(&self, source_key: &str, dest_key: &str) -> Result<(), StoreError> {
        info!(source_key, dest_key, "copy with destination encryption policy");
        let metadata = self.source_metadata(source_key).await?;
        let params = select_copy_encryption_params(&metadata, &self.secrets);
        debug!(empty = params.is_empty(), "selected copy encryption params");

        let request = self
            .client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source_path(&self.bucket, source_key))
            .key(dest_key);

        params
            .apply(request)
            .send()
            .await
            .map_err(|source| StoreError::Copy {
                bucket: self.bucket.clone(),
                source_key: source_key.to_owned(),
                dest_key: dest_key.to_owned(),
                source,
            })?;
        Ok(())
    }
}

/// Build the `x-amz-copy-source` value for a bucket and key.
///
/// S3 requires the value to be URL-encoded; the raw key goes into the
/// request only through its own `key`/`copy_source` fields, never verbatim
/// into this header. Each path segment is encoded separately so the
/// separating slashes stay literal.
fn copy_source_path(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", urlencoding::encode(bucket), encoded_key)
}

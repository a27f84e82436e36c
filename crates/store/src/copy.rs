//! Copy-time encryption parameter selection.
//!
//! A server-side copy decrypts the source object and re-encrypts the
//! destination, so the request must say how: which customer key decrypts
//! the source, and which settings encrypt the destination. Getting the
//! evaluation order right here is what keeps a renamed object from falling
//! back to the provider default encryption.

use aws_sdk_s3::operation::copy_object::builders::CopyObjectFluentBuilder;
use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_sdk_s3::types::ServerSideEncryption;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sse_secrets::{EncryptionMethod, EncryptionSecrets};
use tracing::debug;

/// Customer-key algorithm S3 supports for SSE-C.
const SSE_C_ALGORITHM: &str = "AES256";

/// The slice of a source object's metadata relevant to copy encryption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceObjectMetadata {
    sse_kms_key_id: Option<String>,
}

impl SourceObjectMetadata {
    /// Build from an already-fetched KMS key id.
    pub fn new(sse_kms_key_id: Option<String>) -> Self {
        Self { sse_kms_key_id }
    }

    /// The source object's SSE-KMS key id, if it was KMS-encrypted.
    pub fn sse_kms_key_id(&self) -> Option<&str> {
        self.sse_kms_key_id.as_deref()
    }
}

impl From<&HeadObjectOutput> for SourceObjectMetadata {
    fn from(head: &HeadObjectOutput) -> Self {
        Self {
            sse_kms_key_id: head.ssekms_key_id().map(str::to_owned),
        }
    }
}

/// Customer-supplied key material for SSE-C. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct CustomerKey(String);

impl CustomerKey {
    /// Wrap key material.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key material, as S3 expects it on the request.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base64 MD5 digest of the key material, for the
    /// `x-amz-*-customer-key-MD5` request headers.
    ///
    /// The configured key is the base64-encoded key material; the digest is
    /// computed over the decoded bytes. Returns `None` when the key is not
    /// valid base64, in which case no digest header is sent and the store
    /// rejects the malformed key itself.
    pub fn md5(&self) -> Option<String> {
        let material = BASE64.decode(&self.0).ok()?;
        Some(BASE64.encode(md5::compute(&material).0))
    }
}

impl std::fmt::Debug for CustomerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustomerKey([REDACTED])")
    }
}

/// KMS key settings for a request.
///
/// A `None` key id asks the store to use its default master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsKeyParams {
    key_id: Option<String>,
}

impl KmsKeyParams {
    /// Encrypt with a specific KMS key.
    pub fn with_key(key_id: impl Into<String>) -> Self {
        Self {
            key_id: Some(key_id.into()),
        }
    }

    /// Encrypt with the storage-default master key.
    pub fn storage_default() -> Self {
        Self { key_id: None }
    }

    /// The explicit key id, if any.
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }
}

/// The encryption parameters to attach to one copy request.
///
/// The type does not enforce mutual exclusion between the customer-key and
/// KMS fields; [`select_copy_encryption_params`] does, because only one mode
/// is ever active per [`EncryptionSecrets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyEncryptionParams {
    source_customer_key: Option<CustomerKey>,
    destination_customer_key: Option<CustomerKey>,
    kms: Option<KmsKeyParams>,
}

impl CopyEncryptionParams {
    /// Customer key for decrypting the source object.
    pub fn source_customer_key(&self) -> Option<&CustomerKey> {
        self.source_customer_key.as_ref()
    }

    /// Customer key for encrypting the destination object.
    pub fn destination_customer_key(&self) -> Option<&CustomerKey> {
        self.destination_customer_key.as_ref()
    }

    /// KMS settings for the destination object.
    pub fn kms(&self) -> Option<&KmsKeyParams> {
        self.kms.as_ref()
    }

    /// `true` if no explicit parameter was selected.
    pub fn is_empty(&self) -> bool {
        self.source_customer_key.is_none()
            && self.destination_customer_key.is_none()
            && self.kms.is_none()
    }

    /// Write these parameters into a copy request.
    pub fn apply(&self, mut request: CopyObjectFluentBuilder) -> CopyObjectFluentBuilder {
        if let Some(key) = &self.source_customer_key {
            request = request
                .copy_source_sse_customer_algorithm(SSE_C_ALGORITHM)
                .copy_source_sse_customer_key(key.as_str());
            if let Some(digest) = key.md5() {
                request = request.copy_source_sse_customer_key_md5(digest);
            }
        }
        if let Some(key) = &self.destination_customer_key {
            request = request
                .sse_customer_algorithm(SSE_C_ALGORITHM)
                .sse_customer_key(key.as_str());
            if let Some(digest) = key.md5() {
                request = request.sse_customer_key_md5(digest);
            }
        }
        if let Some(kms) = &self.kms {
            request = request.server_side_encryption(ServerSideEncryption::AwsKms);
            if let Some(id) = kms.key_id() {
                request = request.ssekms_key_id(id);
            }
        }
        request
    }
}

/// Select the encryption parameters for copying `source` into a store whose
/// policy is `destination`.
///
/// The two steps run in a fixed order:
///
/// 1. A non-empty SSE-KMS key id on the source is propagated, so that a
///    plain rename keeps the object's encryption.
/// 2. The destination policy is applied on top. SSE-C attaches the customer
///    key to both the source and destination slots; SSE-KMS *overwrites*
///    whatever step 1 propagated, because the destination bucket's policy
///    must win over a blindly-copied source key id.
///
/// Pure and deterministic; shared freely across concurrent copies.
pub fn select_copy_encryption_params(
    source: &SourceObjectMetadata,
    destination: &EncryptionSecrets,
) -> CopyEncryptionParams {
    let mut params = CopyEncryptionParams::default();

    if let Some(id) = source.sse_kms_key_id().filter(|id| !id.is_empty()) {
        debug!(kms_key_id = id, "propagating SSE-KMS settings from source");
        params.kms = Some(KmsKeyParams::with_key(id));
    }

    match destination.method() {
        EncryptionMethod::SseC => {
            if destination.has_key() {
                let key = CustomerKey::new(destination.key());
                params.source_customer_key = Some(key.clone());
                params.destination_customer_key = Some(key);
            }
        }
        EncryptionMethod::SseKms => {
            params.kms = Some(if destination.has_key() {
                KmsKeyParams::with_key(destination.key())
            } else {
                KmsKeyParams::storage_default()
            });
        }
        // No explicit destination policy: whatever step 1 propagated stays.
        EncryptionMethod::None | EncryptionMethod::SseS3 => {}
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with_kms(id: &str) -> SourceObjectMetadata {
        SourceObjectMetadata::new(Some(id.to_owned()))
    }

    #[test]
    fn source_kms_id_propagates_when_destination_has_no_policy() {
        let params = select_copy_encryption_params(
            &source_with_kms("arn:kms:1"),
            &EncryptionSecrets::default(),
        );
        assert_eq!(params.kms(), Some(&KmsKeyParams::with_key("arn:kms:1")));
        assert!(params.source_customer_key().is_none());
        assert!(params.destination_customer_key().is_none());
    }

    #[test]
    fn sse_c_destination_attaches_key_to_both_slots() {
        let destination = EncryptionSecrets::new(EncryptionMethod::SseC, "abc123");
        let params = select_copy_encryption_params(&source_with_kms("arn:kms:1"), &destination);
        assert_eq!(
            params.source_customer_key(),
            Some(&CustomerKey::new("abc123"))
        );
        assert_eq!(
            params.destination_customer_key(),
            Some(&CustomerKey::new("abc123"))
        );
    }

    #[test]
    fn sse_kms_destination_overrides_propagated_source_id() {
        let destination = EncryptionSecrets::new(EncryptionMethod::SseKms, "arn:kms:2");
        let params = select_copy_encryption_params(&source_with_kms("arn:kms:1"), &destination);
        assert_eq!(params.kms(), Some(&KmsKeyParams::with_key("arn:kms:2")));
    }

    #[test]
    fn sse_kms_destination_without_key_requests_storage_default() {
        let destination = EncryptionSecrets::new(EncryptionMethod::SseKms, "");
        let params =
            select_copy_encryption_params(&SourceObjectMetadata::default(), &destination);
        assert_eq!(params.kms(), Some(&KmsKeyParams::storage_default()));
        assert_eq!(params.kms().unwrap().key_id(), None);
    }

    #[test]
    fn sse_s3_destination_keeps_propagated_source_id() {
        let destination = EncryptionSecrets::new(EncryptionMethod::SseS3, "");
        let params = select_copy_encryption_params(&source_with_kms("arn:kms:1"), &destination);
        assert_eq!(params.kms(), Some(&KmsKeyParams::with_key("arn:kms:1")));
    }

    #[test]
    fn unencrypted_source_and_destination_select_nothing() {
        let params = select_copy_encryption_params(
            &SourceObjectMetadata::default(),
            &EncryptionSecrets::default(),
        );
        assert!(params.is_empty());
    }

    #[test]
    fn empty_source_kms_id_is_ignored() {
        let params = select_copy_encryption_params(
            &SourceObjectMetadata::new(Some(String::new())),
            &EncryptionSecrets::default(),
        );
        assert!(params.is_empty());
    }

    #[test]
    fn customer_key_debug_is_redacted() {
        let key = CustomerKey::new("mysecretkey");
        assert_eq!(format!("{key:?}"), "CustomerKey([REDACTED])");
    }

    #[test]
    fn customer_key_md5_digests_the_decoded_material() {
        // base64("abc"); MD5("abc") = 900150983cd24fb0d6963f7d28e17f72.
        let key = CustomerKey::new("YWJj");
        assert_eq!(key.md5().as_deref(), Some("kAFQmDzST7DWlj99KOF/cg=="));

        // A full 32-byte AES-256 key.
        let key = CustomerKey::new("AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=");
        assert_eq!(key.md5().as_deref(), Some("tP/LI3N87DFaSk0aoqYgzg=="));
    }

    #[test]
    fn customer_key_md5_is_none_for_non_base64_material() {
        assert_eq!(CustomerKey::new("not!!base64").md5(), None);
    }

    mod apply {
        use super::*;

        fn offline_client() -> aws_sdk_s3::Client {
            let conf = aws_sdk_s3::Config::builder()
                .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                .build();
            aws_sdk_s3::Client::from_conf(conf)
        }

        #[test]
        fn kms_params_set_sse_and_key_id() {
            let client = offline_client();
            let destination = EncryptionSecrets::new(EncryptionMethod::SseKms, "arn:kms:2");
            let params =
                select_copy_encryption_params(&source_with_kms("arn:kms:1"), &destination);

            let request = params.apply(client.copy_object());
            assert_eq!(
                request.get_server_side_encryption(),
                &Some(ServerSideEncryption::AwsKms)
            );
            assert_eq!(request.get_ssekms_key_id().as_deref(), Some("arn:kms:2"));
            assert!(request.get_sse_customer_key().is_none());
        }

        #[test]
        fn storage_default_kms_sets_no_key_id() {
            let client = offline_client();
            let destination = EncryptionSecrets::new(EncryptionMethod::SseKms, "");
            let params =
                select_copy_encryption_params(&SourceObjectMetadata::default(), &destination);

            let request = params.apply(client.copy_object());
            assert_eq!(
                request.get_server_side_encryption(),
                &Some(ServerSideEncryption::AwsKms)
            );
            assert!(request.get_ssekms_key_id().is_none());
        }

        #[test]
        fn customer_key_fills_both_request_slots() {
            let client = offline_client();
            let destination = EncryptionSecrets::new(EncryptionMethod::SseC, "YWJj");
            let params =
                select_copy_encryption_params(&SourceObjectMetadata::default(), &destination);

            let request = params.apply(client.copy_object());
            assert_eq!(
                request.get_copy_source_sse_customer_key().as_deref(),
                Some("YWJj")
            );
            assert_eq!(request.get_sse_customer_key().as_deref(), Some("YWJj"));
            assert_eq!(
                request.get_sse_customer_algorithm().as_deref(),
                Some("AES256")
            );
            assert_eq!(
                request.get_copy_source_sse_customer_algorithm().as_deref(),
                Some("AES256")
            );
            assert_eq!(
                request.get_sse_customer_key_md5().as_deref(),
                Some("kAFQmDzST7DWlj99KOF/cg==")
            );
            assert_eq!(
                request.get_copy_source_sse_customer_key_md5().as_deref(),
                Some("kAFQmDzST7DWlj99KOF/cg==")
            );
            assert!(request.get_server_side_encryption().is_none());
        }

        #[test]
        fn non_base64_customer_key_sends_no_md5_header() {
            let client = offline_client();
            let destination = EncryptionSecrets::new(EncryptionMethod::SseC, "not!!base64");
            let params =
                select_copy_encryption_params(&SourceObjectMetadata::default(), &destination);

            let request = params.apply(client.copy_object());
            assert_eq!(
                request.get_sse_customer_key().as_deref(),
                Some("not!!base64")
            );
            assert!(request.get_sse_customer_key_md5().is_none());
            assert!(request.get_copy_source_sse_customer_key_md5().is_none());
        }

        #[test]
        fn empty_params_leave_the_request_untouched() {
            let client = offline_client();
            let request = CopyEncryptionParams::default().apply(client.copy_object());
            assert!(request.get_server_side_encryption().is_none());
            assert!(request.get_ssekms_key_id().is_none());
            assert!(request.get_sse_customer_key().is_none());
            assert!(request.get_copy_source_sse_customer_key().is_none());
        }
    }
}

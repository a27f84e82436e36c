//! Value types for S3 server-side-encryption settings.
//!
//! This crate deliberately has no dependency on the AWS SDK: the wire format
//! for [`EncryptionSecrets`] is used to propagate encryption settings across
//! process boundaries (e.g. inside delegation tokens), and consumers must be
//! able to unmarshal it without the SDK on their dependency tree.

pub mod method;
pub mod secrets;
pub mod wire;

pub use method::EncryptionMethod;
pub use secrets::EncryptionSecrets;
pub use wire::{WireError, MAX_SECRET_LEN, WIRE_VERSION};

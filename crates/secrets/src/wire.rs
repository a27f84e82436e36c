//! Versioned binary wire format for [`EncryptionSecrets`].
//!
//! Layout, fixed order, no padding:
//! 1. 8-byte big-endian version tag ([`WIRE_VERSION`]).
//! 2. `algorithm`: u32 big-endian byte length, then UTF-8 bytes.
//! 3. `key`: same encoding.
//!
//! *Important.* If the layout is ever changed incompatibly, bump
//! [`WIRE_VERSION`] so that older readers reject the payload instead of
//! misinterpreting it.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::secrets::EncryptionSecrets;

/// Version tag written ahead of every payload. Spells `SSECRET1` in ASCII.
pub const WIRE_VERSION: u64 = u64::from_be_bytes(*b"SSECRET1");

/// Maximum length of either field, in characters.
pub const MAX_SECRET_LEN: usize = 2048;

/// Upper bound on a field's encoded byte length (UTF-8 worst case), checked
/// before any allocation happens during a read.
const MAX_FIELD_BYTES: usize = MAX_SECRET_LEN * 4;

/// Errors from encoding or decoding the wire format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// The payload starts with a version tag from an incompatible revision.
    /// Nothing past the tag is read.
    #[error("incompatible encryption secrets version: expected {expected:#x}, found {found:#x}")]
    VersionMismatch {
        /// The tag this revision writes and accepts.
        expected: u64,
        /// The tag found in the payload.
        found: u64,
    },

    /// A field exceeds the [`MAX_SECRET_LEN`] bound.
    #[error("{field} of length {len} exceeds the {MAX_SECRET_LEN} character bound")]
    FieldTooLong {
        /// Which field was oversized.
        field: &'static str,
        /// Observed length (characters on encode, bytes on decode).
        len: usize,
    },

    /// The buffer ended before the layout was fully read.
    #[error("truncated payload while reading {0}")]
    Truncated(&'static str),

    /// A field's bytes are not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),
}

impl EncryptionSecrets {
    /// Encode to the versioned wire format.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::FieldTooLong`] if either field exceeds
    /// [`MAX_SECRET_LEN`] characters.
    pub fn to_wire(&self) -> Result<Bytes, WireError> {
        let mut buf =
            BytesMut::with_capacity(8 + 4 + self.algorithm().len() + 4 + self.key().len());
        buf.put_u64(WIRE_VERSION);
        put_field(&mut buf, "algorithm", self.algorithm())?;
        put_field(&mut buf, "key", self.key())?;
        Ok(buf.freeze())
    }

    /// Decode from the versioned wire format, re-deriving the method from
    /// the algorithm name.
    ///
    /// Mode/key consistency is *not* re-validated here; a consumer applying
    /// these secrets under a different policy context should re-validate via
    /// its policy resolver.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::VersionMismatch`] before reading any field if
    /// the tag differs from [`WIRE_VERSION`]; otherwise any of the
    /// truncation, bound, or UTF-8 errors. No partially-populated value is
    /// ever produced.
    pub fn from_wire(buf: &mut impl Buf) -> Result<Self, WireError> {
        if buf.remaining() < 8 {
            return Err(WireError::Truncated("version tag"));
        }
        let found = buf.get_u64();
        if found != WIRE_VERSION {
            return Err(WireError::VersionMismatch {
                expected: WIRE_VERSION,
                found,
            });
        }
        let algorithm = get_field(buf, "algorithm")?;
        let key = get_field(buf, "key")?;
        Ok(EncryptionSecrets::from_parts(algorithm, key))
    }
}

fn put_field(buf: &mut BytesMut, field: &'static str, value: &str) -> Result<(), WireError> {
    let chars = value.chars().count();
    if chars > MAX_SECRET_LEN {
        return Err(WireError::FieldTooLong { field, len: chars });
    }
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
    Ok(())
}

fn get_field(buf: &mut impl Buf, field: &'static str) -> Result<String, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::Truncated(field));
    }
    let len = buf.get_u32() as usize;
    if len > MAX_FIELD_BYTES {
        return Err(WireError::FieldTooLong { field, len });
    }
    if buf.remaining() < len {
        return Err(WireError::Truncated(field));
    }
    let raw = buf.copy_to_bytes(len);
    let value = String::from_utf8(raw.to_vec()).map_err(|_| WireError::InvalidUtf8(field))?;
    let chars = value.chars().count();
    if chars > MAX_SECRET_LEN {
        return Err(WireError::FieldTooLong { field, len: chars });
    }
    Ok(value)
}

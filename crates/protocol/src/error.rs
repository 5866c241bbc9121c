//! Protocol error types
//!
//! Errors that can occur when encoding, decoding, or unbatching records.

use thiserror::Error;

/// Errors that can occur during codec and framing operations
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is too short to contain the next field
    #[error("message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort { expected: usize, actual: usize },

    /// Payload was written by a newer schema than this reader knows
    #[error("unknown version {version}: max supported is {max}")]
    UnknownVersion { version: u32, max: u32 },

    /// A count field exceeds its declared array capacity
    #[error("{field} count {count} exceeds capacity {max}")]
    CountOutOfRange {
        field: &'static str,
        count: i32,
        max: usize,
    },

    /// A string field exceeds its declared maximum length
    #[error("{field} length {len} exceeds maximum {max}")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A numeric field is outside its serializable range
    #[error("{field} value out of range")]
    ValueOutOfRange { field: &'static str },

    /// A string field contains invalid UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    /// A frame length prefix claims more bytes than remain in the batch
    #[error("truncated frame at offset {offset}: need {need} bytes, {remaining} remain")]
    TruncatedFrame {
        offset: usize,
        need: usize,
        remaining: usize,
    },
}

impl CodecError {
    /// Create a message too short error
    #[inline]
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Create an unknown version error
    #[inline]
    pub fn unknown_version(version: u32, max: u32) -> Self {
        Self::UnknownVersion { version, max }
    }

    /// Create a count out of range error
    #[inline]
    pub fn count_out_of_range(field: &'static str, count: i32, max: usize) -> Self {
        Self::CountOutOfRange { field, count, max }
    }

    /// Create a string too long error
    #[inline]
    pub fn string_too_long(field: &'static str, len: usize, max: usize) -> Self {
        Self::StringTooLong { field, len, max }
    }

    /// Check if this error indicates corrupt data (as opposed to a
    /// version or bounds mismatch the producer could have avoided)
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MessageTooShort { .. } | Self::TruncatedFrame { .. } | Self::InvalidUtf8 { .. }
        )
    }
}

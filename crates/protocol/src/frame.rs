//! Length-prefixed batch framing
//!
//! A batched bus message is the concatenation of framed records:
//!
//! ```text
//! [u32 length][length bytes][u32 length][length bytes]...
//! ```
//!
//! `FrameBuilder` accumulates framed messages for a publisher shard;
//! `split_frames` reverses the operation on the subscriber side. Reading
//! stops cleanly when the offset reaches the end of the buffer; any other
//! termination is a corruption error, never a panic.

use bytes::Bytes;

use crate::{CodecError, Result};

/// Default accumulation buffer capacity in bytes (64KB)
const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Accumulates length-prefixed messages into one wire buffer
///
/// # Design
///
/// - Owns one growing buffer plus a message counter
/// - `take()` cuts the buffer out as `Bytes` and resets the builder, so
///   the caller can release a lock before performing network I/O
#[derive(Debug)]
pub struct FrameBuilder {
    buffer: Vec<u8>,
    message_count: usize,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    /// Create a builder with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a builder with the given buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            message_count: 0,
        }
    }

    /// Append one framed message
    pub fn push(&mut self, message: &[u8]) {
        self.buffer
            .extend_from_slice(&(message.len() as u32).to_le_bytes());
        self.buffer.extend_from_slice(message);
        self.message_count += 1;
    }

    /// Number of framed messages currently buffered
    #[inline]
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    /// Current buffer length in bytes, including length prefixes
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no messages are buffered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.message_count == 0
    }

    /// Cut the accumulated buffer out as a standalone wire message and
    /// reset the builder
    pub fn take(&mut self) -> Bytes {
        self.message_count = 0;
        Bytes::from(std::mem::take(&mut self.buffer))
    }
}

/// Iterator over the framed sub-payloads of a batched wire buffer
///
/// Yields payload slices in push order. A corrupt frame yields one `Err`
/// and then the iterator stops; payloads already yielded remain valid, so
/// callers can keep what was read before the corruption point.
pub struct FrameIter<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let remaining = self.data.len() - self.offset;
        if remaining < 4 {
            self.failed = true;
            return Some(Err(CodecError::TruncatedFrame {
                offset: self.offset,
                need: 4,
                remaining,
            }));
        }
        let len = u32::from_le_bytes([
            self.data[self.offset],
            self.data[self.offset + 1],
            self.data[self.offset + 2],
            self.data[self.offset + 3],
        ]) as usize;
        self.offset += 4;

        let remaining = self.data.len() - self.offset;
        if len > remaining {
            self.failed = true;
            return Some(Err(CodecError::TruncatedFrame {
                offset: self.offset,
                need: len,
                remaining,
            }));
        }
        let frame = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Some(Ok(frame))
    }
}

/// Iterate over the framed sub-payloads of a batched wire buffer
pub fn iter_frames(data: &[u8]) -> FrameIter<'_> {
    FrameIter {
        data,
        offset: 0,
        failed: false,
    }
}

/// Split a batched wire buffer back into its framed sub-payloads
///
/// Returns the payload slices in the order they were pushed. An empty
/// buffer yields an empty list. A length prefix that claims more bytes
/// than remain, or a truncated prefix, is a `TruncatedFrame` error.
pub fn split_frames(data: &[u8]) -> Result<Vec<&[u8]>> {
    iter_frames(data).collect()
}

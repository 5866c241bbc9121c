//! Publisher error types

use backhaul_protocol::CodecError;
use thiserror::Error;

/// Errors returned synchronously by `ShardedPublisher::submit`
///
/// Bus transport failures are not here: they surface asynchronously on
/// the per-shard publish task and are counted and logged there.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The target shard's buffer is at its count threshold and has not
    /// flushed yet. Recoverable; the caller should retry after backoff.
    #[error("entries buffer full")]
    BufferFull,

    /// The entry could not be serialized
    #[error("failed to encode entry: {0}")]
    Encode(#[from] CodecError),
}

impl PublishError {
    /// Check if the caller can retry the same entry later
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::BufferFull)
    }
}

//! Message bus collaborator contract
//!
//! The pipeline does not ship a bus client; the embedding service adapts
//! whatever broker it uses (cloud pub/sub, a local emulator, an in-memory
//! double for tests) to this trait.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors surfaced by the bus transport
#[derive(Debug, Error)]
pub enum BusError {
    /// The broker rejected or failed to deliver the message
    #[error("bus transport error: {0}")]
    Transport(String),

    /// The broker is unreachable
    #[error("bus unavailable: {0}")]
    Unavailable(String),
}

/// Publishing side of the message bus
///
/// One batched wire message per call. Implementations are shared across
/// all shards of a publisher, so they must be cheap to call concurrently.
#[async_trait]
pub trait BusPublisher: Send + Sync + 'static {
    /// Deliver one batched message to the bus
    async fn publish(&self, payload: Bytes) -> Result<(), BusError>;
}

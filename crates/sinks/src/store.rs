//! Bulk storage collaborator contract
//!
//! The analytical store itself (a columnar warehouse, a table inserter)
//! lives outside this crate; the sink only needs a bulk-insert call. The
//! pipeline is at-least-once end-to-end, so implementations must tolerate
//! receiving the same logical entry more than once.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by the storage collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    /// The bulk insert failed
    #[error("storage write failed: {0}")]
    Write(String),

    /// The store is unreachable
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Bulk-insert side of the storage collaborator
#[async_trait]
pub trait EntryStore<R>: Send + Sync + 'static {
    /// Write a batch of entries in one call
    async fn put(&self, entries: &[R]) -> Result<(), StoreError>;
}

/// Store double that discards every batch
///
/// Used in tests and in deployments where a record kind is collected but
/// not yet persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl<R: Send + Sync + 'static> EntryStore<R> for NullStore {
    async fn put(&self, _entries: &[R]) -> Result<(), StoreError> {
        Ok(())
    }
}

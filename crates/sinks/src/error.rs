//! Sink error types

use thiserror::Error;

/// Errors returned synchronously by `SinkHandle::submit`
///
/// The retriable variants give the entry back so the caller can resubmit
/// the same record after backoff without cloning.
#[derive(Debug, Error)]
pub enum SubmitError<R> {
    /// The entry failed structural validation and was not enqueued
    #[error("invalid {kind} entry: bad {field}")]
    Invalid {
        kind: &'static str,
        field: &'static str,
    },

    /// The bounded input queue is full. Recoverable; the forwarder
    /// retries with backoff, slowing the pipeline instead of dropping.
    #[error("entries queue full")]
    QueueFull(R),

    /// The writer loop has stopped and the queue is closed
    #[error("sink is closed")]
    Closed(R),
}

impl<R> SubmitError<R> {
    /// Check if the caller should retry the same entry after backoff
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::QueueFull(_))
    }

    /// Recover the entry from a rejected submit, if it was enqueued-free
    pub fn into_entry(self) -> Option<R> {
        match self {
            Self::QueueFull(entry) | Self::Closed(entry) => Some(entry),
            Self::Invalid { .. } => None,
        }
    }
}

//! Forwarder error types

use thiserror::Error;

/// Fatal forwarder failures
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The receive loop ended for a reason other than deliberate
    /// shutdown. The owning process should exit and let its supervisor
    /// restart it; the bus redelivers anything unacked.
    #[error("receive loop terminated unexpectedly")]
    ReceiveLoopTerminated,
}

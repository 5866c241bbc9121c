//! Backhaul Gateway - batched relay-update fan-out over HTTP
//!
//! The HTTP sibling of the publisher/forwarder pair, fused into one
//! component with no bus in between. Raw relay-update payloads are framed
//! and accumulated in one mutex-guarded buffer; when the batch-size
//! threshold is crossed the buffer is swapped out under the lock and
//! POSTed - outside the lock - to every configured backend replica
//! independently and concurrently. One backend failing never blocks or
//! fails delivery to the others.
//!
//! Shutdown performs exactly one final flush of whatever remains
//! buffered, so no accumulated batch is lost on graceful termination.

mod client;
mod error;
mod metrics;

pub use client::{GatewayBatchClient, GatewayConfig};
pub use error::GatewayError;
pub use metrics::{GatewayMetrics, GatewayMetricsHandle};

// Test modules - only compiled during testing
#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

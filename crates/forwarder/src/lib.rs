//! Backhaul Forwarder - bus subscriber feeding the storage sink
//!
//! The consumer-facing half of the pipeline. One batched bus message is
//! split back into framed sub-payloads, each sub-payload is decoded with
//! version-aware field skipping, and every decoded entry is submitted to
//! the sink. A saturated sink deliberately slows the forwarder down
//! (bounded retry with a fixed sleep) instead of dropping data; retry
//! exhaustion or a decode failure without the entry veto turns into a
//! Nack, triggering bus-level redelivery.
//!
//! The contract end-to-end is at-least-once: a message is acked only
//! after every sub-payload has been submitted, so a crash between partial
//! submission and ack resubmits some entries on redelivery. Downstream
//! storage must tolerate duplicates.

mod delivery;
mod error;
mod forwarder;
mod metrics;

pub use delivery::{Delivery, Disposition};
pub use error::ForwardError;
pub use forwarder::{EntrySubmitter, Forwarder, ForwarderConfig};
pub use metrics::{ForwarderMetrics, ForwarderMetricsHandle};

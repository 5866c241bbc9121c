//! Backhaul Sinks - buffering adapter between forwarders and bulk storage
//!
//! An `EntrySink` accepts decoded entries over a bounded queue, buffers
//! them in memory, and performs one bulk write to the storage collaborator
//! every time the buffer crosses its flush threshold. A bulk-write failure
//! keeps the buffer, so the entries are retried on the next crossing; the
//! pipeline trades redundant storage attempts for never silently dropping
//! buffered data.
//!
//! `submit` never blocks: a full queue is a typed `SubmitError::QueueFull`
//! carrying the entry back, which the forwarder's bounded-retry loop
//! converts into backpressure.

mod error;
mod metrics;
mod sink;
mod store;

pub use error::SubmitError;
pub use metrics::{SinkMetrics, SinkMetricsHandle};
pub use sink::{EntrySink, SinkConfig, SinkHandle};
pub use store::{EntryStore, NullStore, StoreError};

//! Backhaul Publisher - sharded batch publishing to the message bus
//!
//! The producer-facing half of the pipeline. Entries are routed to one of
//! N independent shards by a hash of their session key, framed with a
//! length prefix, and accumulated in a per-shard buffer. When a shard's
//! buffer crosses both the count threshold and the byte threshold it is
//! cut out as one batched bus message and handed to the shard's dedicated
//! publish task, so bus I/O never runs under the buffer lock and never
//! blocks producers.
//!
//! `Submit` never blocks on the network: it either appends to an
//! in-memory buffer synchronously or fails fast with
//! [`PublishError::BufferFull`], which callers treat as a retry-later
//! condition.

mod bus;
mod error;
mod metrics;
mod publisher;

pub use bus::{BusError, BusPublisher};
pub use error::PublishError;
pub use metrics::{PublisherMetrics, PublisherMetricsHandle};
pub use publisher::{PublisherConfig, ShardedPublisher};

// Test modules - only compiled during testing
#[cfg(test)]
#[path = "publisher_test.rs"]
mod publisher_test;

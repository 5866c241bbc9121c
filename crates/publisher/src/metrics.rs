//! Publisher metrics
//!
//! Atomic counters owned by the publisher via `Arc`; the handle stays
//! valid after `close()` consumes the publisher.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backhaul_metrics::{PublisherMetricsProvider, PublisherMetricsSnapshot};

/// Metrics for a sharded publisher
#[derive(Debug, Default)]
pub struct PublisherMetrics {
    /// Entries accepted into a shard buffer
    pub entries_submitted: AtomicU64,

    /// Entries refused because the shard buffer was full
    pub entries_rejected: AtomicU64,

    /// Entries that failed to encode
    pub encode_failures: AtomicU64,

    /// Batches handed to the bus
    pub batches_published: AtomicU64,

    /// Bytes handed to the bus
    pub bytes_published: AtomicU64,

    /// Publishes the bus reported as failed
    pub publish_failures: AtomicU64,
}

impl PublisherMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            entries_submitted: AtomicU64::new(0),
            entries_rejected: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            batches_published: AtomicU64::new(0),
            bytes_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
        }
    }

    /// Record an accepted entry
    #[inline]
    pub fn record_submitted(&self) {
        self.entries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a buffer-full rejection
    #[inline]
    pub fn record_rejected(&self) {
        self.entries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an encode failure
    #[inline]
    pub fn record_encode_failure(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch successfully handed to the bus
    #[inline]
    pub fn record_published(&self, bytes: u64) {
        self.batches_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed bus publish
    #[inline]
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> PublisherMetricsSnapshot {
        PublisherMetricsSnapshot {
            entries_submitted: self.entries_submitted.load(Ordering::Relaxed),
            entries_rejected: self.entries_rejected.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            batches_published: self.batches_published.load(Ordering::Relaxed),
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing publisher metrics externally
///
/// Implements `PublisherMetricsProvider` for use with a metrics reporter.
#[derive(Clone)]
pub struct PublisherMetricsHandle {
    pub(crate) id: String,
    pub(crate) kind: &'static str,
    pub(crate) metrics: Arc<PublisherMetrics>,
}

impl PublisherMetricsProvider for PublisherMetricsHandle {
    fn publisher_id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> &str {
        self.kind
    }

    fn snapshot(&self) -> PublisherMetricsSnapshot {
        self.metrics.snapshot()
    }
}

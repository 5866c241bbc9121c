//! Sink metrics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backhaul_metrics::{SinkMetricsProvider, SinkMetricsSnapshot};

/// Metrics for a buffering entry sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Entries offered to the sink
    pub entries_submitted: AtomicU64,

    /// Entries rejected by validation
    pub entries_invalid: AtomicU64,

    /// Entries carrying at least one NaN/Inf float
    pub entries_with_nan: AtomicU64,

    /// Entries refused because the queue was full
    pub queue_full_rejections: AtomicU64,

    /// Entries written to the store
    pub entries_written: AtomicU64,

    /// Bulk writes that failed
    pub write_failures: AtomicU64,

    /// Bulk writes performed
    pub flush_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            entries_submitted: AtomicU64::new(0),
            entries_invalid: AtomicU64::new(0),
            entries_with_nan: AtomicU64::new(0),
            queue_full_rejections: AtomicU64::new(0),
            entries_written: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
        }
    }

    /// Record an entry accepted onto the queue
    #[inline]
    pub fn record_submitted(&self) {
        self.entries_submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a validation rejection
    #[inline]
    pub fn record_invalid(&self) {
        self.entries_invalid.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an entry that needed NaN/Inf sanitization
    #[inline]
    pub fn record_nan(&self) {
        self.entries_with_nan.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a queue-full rejection
    #[inline]
    pub fn record_queue_full(&self) {
        self.queue_full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful bulk write
    #[inline]
    pub fn record_written(&self, entries: u64) {
        self.entries_written.fetch_add(entries, Ordering::Relaxed);
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed bulk write
    #[inline]
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            entries_submitted: self.entries_submitted.load(Ordering::Relaxed),
            entries_invalid: self.entries_invalid.load(Ordering::Relaxed),
            entries_with_nan: self.entries_with_nan.load(Ordering::Relaxed),
            queue_full_rejections: self.queue_full_rejections.load(Ordering::Relaxed),
            entries_written: self.entries_written.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            flush_count: self.flush_count.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing sink metrics externally
///
/// Implements `SinkMetricsProvider` and remains valid after `run()`
/// consumes the sink.
#[derive(Clone)]
pub struct SinkMetricsHandle {
    pub(crate) id: String,
    pub(crate) kind: &'static str,
    pub(crate) metrics: Arc<SinkMetrics>,
}

impl SinkMetricsProvider for SinkMetricsHandle {
    fn sink_id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> &str {
        self.kind
    }

    fn snapshot(&self) -> SinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

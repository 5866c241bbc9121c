//! Forwarder metrics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backhaul_metrics::{ForwarderMetricsProvider, ForwarderMetricsSnapshot};

/// Metrics for a batch forwarder
#[derive(Debug, Default)]
pub struct ForwarderMetrics {
    /// Bus messages received
    pub messages_received: AtomicU64,

    /// Bus messages acked
    pub messages_acked: AtomicU64,

    /// Bus messages nacked
    pub messages_nacked: AtomicU64,

    /// Entries decoded and submitted to the sink
    pub entries_forwarded: AtomicU64,

    /// Batches that failed to unframe completely
    pub framing_errors: AtomicU64,

    /// Entries that failed to decode
    pub read_failures: AtomicU64,

    /// Undecodable entries dropped because entry veto is on
    pub entries_vetoed: AtomicU64,

    /// Messages nacked after exhausting sink submit retries
    pub retry_limit_reached: AtomicU64,
}

impl ForwarderMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_acked: AtomicU64::new(0),
            messages_nacked: AtomicU64::new(0),
            entries_forwarded: AtomicU64::new(0),
            framing_errors: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
            entries_vetoed: AtomicU64::new(0),
            retry_limit_reached: AtomicU64::new(0),
        }
    }

    /// Record a received message
    #[inline]
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a settled message
    #[inline]
    pub fn record_settled(&self, acked: bool) {
        if acked {
            self.messages_acked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.messages_nacked.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an entry submitted to the sink
    #[inline]
    pub fn record_forwarded(&self) {
        self.entries_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a framing error
    #[inline]
    pub fn record_framing_error(&self) {
        self.framing_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decode failure
    #[inline]
    pub fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a vetoed entry
    #[inline]
    pub fn record_veto(&self) {
        self.entries_vetoed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record retry exhaustion
    #[inline]
    pub fn record_retry_limit(&self) {
        self.retry_limit_reached.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> ForwarderMetricsSnapshot {
        ForwarderMetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_acked: self.messages_acked.load(Ordering::Relaxed),
            messages_nacked: self.messages_nacked.load(Ordering::Relaxed),
            entries_forwarded: self.entries_forwarded.load(Ordering::Relaxed),
            framing_errors: self.framing_errors.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            entries_vetoed: self.entries_vetoed.load(Ordering::Relaxed),
            retry_limit_reached: self.retry_limit_reached.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing forwarder metrics externally
///
/// Implements `ForwarderMetricsProvider` and remains valid after `run()`
/// consumes the forwarder.
#[derive(Clone)]
pub struct ForwarderMetricsHandle {
    pub(crate) id: String,
    pub(crate) kind: &'static str,
    pub(crate) metrics: Arc<ForwarderMetrics>,
}

impl ForwarderMetricsProvider for ForwarderMetricsHandle {
    fn forwarder_id(&self) -> &str {
        &self.id
    }

    fn record_kind(&self) -> &str {
        self.kind
    }

    fn snapshot(&self) -> ForwarderMetricsSnapshot {
        self.metrics.snapshot()
    }
}

//! Gateway metrics

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backhaul_metrics::{GatewayMetricsProvider, GatewayMetricsSnapshot};

/// Metrics for a gateway batch client
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Raw update payloads received
    pub updates_received: AtomicU64,

    /// Updates dropped because the intake queue was full
    pub updates_dropped: AtomicU64,

    /// Updates flushed to the backends
    pub updates_flushed: AtomicU64,

    /// Batches flushed
    pub batches_flushed: AtomicU64,

    /// Per-backend sends that succeeded
    pub backend_sends: AtomicU64,

    /// Per-backend sends that failed
    pub backend_send_failures: AtomicU64,
}

impl GatewayMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            updates_received: AtomicU64::new(0),
            updates_dropped: AtomicU64::new(0),
            updates_flushed: AtomicU64::new(0),
            batches_flushed: AtomicU64::new(0),
            backend_sends: AtomicU64::new(0),
            backend_send_failures: AtomicU64::new(0),
        }
    }

    /// Record a received update
    #[inline]
    pub fn record_received(&self) {
        self.updates_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an update dropped at intake
    #[inline]
    pub fn record_dropped(&self) {
        self.updates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a flushed batch
    #[inline]
    pub fn record_flush(&self, updates: u64) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.updates_flushed.fetch_add(updates, Ordering::Relaxed);
    }

    /// Record a successful per-backend send
    #[inline]
    pub fn record_backend_send(&self) {
        self.backend_sends.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed per-backend send
    #[inline]
    pub fn record_backend_failure(&self) {
        self.backend_send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> GatewayMetricsSnapshot {
        GatewayMetricsSnapshot {
            updates_received: self.updates_received.load(Ordering::Relaxed),
            updates_dropped: self.updates_dropped.load(Ordering::Relaxed),
            updates_flushed: self.updates_flushed.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            backend_sends: self.backend_sends.load(Ordering::Relaxed),
            backend_send_failures: self.backend_send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Handle for accessing gateway metrics externally
///
/// Implements `GatewayMetricsProvider` and remains valid after `run()`
/// consumes the worker.
#[derive(Clone)]
pub struct GatewayMetricsHandle {
    pub(crate) id: String,
    pub(crate) metrics: Arc<GatewayMetrics>,
}

impl GatewayMetricsProvider for GatewayMetricsHandle {
    fn gateway_id(&self) -> &str {
        &self.id
    }

    fn snapshot(&self) -> GatewayMetricsSnapshot {
        self.metrics.snapshot()
    }
}

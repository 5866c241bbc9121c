//! Buffering entry sink
//!
//! One bounded queue, one writer loop. All mutation of the write buffer
//! happens on the writer task; producers only touch the queue.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use backhaul_metrics::SinkMetricsSnapshot;
use backhaul_protocol::{Record, Storable};

use crate::error::SubmitError;
use crate::metrics::{SinkMetrics, SinkMetricsHandle};
use crate::store::EntryStore;

/// Configuration for an entry sink
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Target bulk-write size in entries
    pub batch_size: usize,

    /// Fraction of `batch_size` at which the writer flushes, in (0, 1]
    pub batch_percent: f64,

    /// Bounded input queue capacity
    pub channel_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_percent: 1.0,
            channel_size: 20_000,
        }
    }
}

impl SinkConfig {
    /// Set the bulk-write batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the flush fraction
    #[must_use]
    pub fn with_batch_percent(mut self, percent: f64) -> Self {
        self.batch_percent = percent;
        self
    }

    /// Set the input queue capacity
    #[must_use]
    pub fn with_channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    /// Buffered entries at which the writer flushes
    pub fn flush_threshold(&self) -> usize {
        ((self.batch_size as f64) * self.batch_percent).round().max(1.0) as usize
    }
}

/// Producer side of an entry sink
///
/// Cheap to clone. `submit` validates and sanitizes, then enqueues
/// without blocking. The producer that owns the last handle closes the
/// queue by dropping it, exactly once, after it stops submitting.
pub struct SinkHandle<R> {
    tx: mpsc::Sender<R>,
    metrics: Arc<SinkMetrics>,
    name: String,
}

impl<R> Clone for SinkHandle<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            metrics: Arc::clone(&self.metrics),
            name: self.name.clone(),
        }
    }
}

impl<R: Record + Storable> SinkHandle<R> {
    /// Submit one entry for storage
    ///
    /// Light validation rejects structurally invalid entries; NaN and
    /// infinite floats are zeroed and counted, never propagated into
    /// storage. A full queue returns [`SubmitError::QueueFull`] carrying
    /// the entry back so the caller can apply backpressure and resubmit.
    pub fn submit(&self, mut entry: R) -> Result<(), SubmitError<R>> {
        if let Err(field) = entry.validate() {
            self.metrics.record_invalid();
            tracing::warn!(
                sink = %self.name,
                kind = R::KIND,
                field,
                "rejected invalid entry"
            );
            return Err(SubmitError::Invalid {
                kind: R::KIND,
                field,
            });
        }

        let sanitized = entry.sanitize_floats();
        if !sanitized.is_empty() {
            self.metrics.record_nan();
            tracing::warn!(
                sink = %self.name,
                kind = R::KIND,
                fields = ?sanitized,
                "entry had NaN or Inf values, zeroed"
            );
        }

        match self.tx.try_send(entry) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(entry)) => {
                self.metrics.record_queue_full();
                Err(SubmitError::QueueFull(entry))
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => Err(SubmitError::Closed(entry)),
        }
    }

    /// Close the input queue
    ///
    /// Only the producer may do this, exactly once, after it stops
    /// submitting; the writer loop then drains and performs its final
    /// bulk write. Dropping every handle has the same effect.
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Buffering sink between a forwarder and bulk storage
///
/// # Design
///
/// - `run` is the single consumer of the queue and the only code that
///   touches the write buffer
/// - A failed bulk write keeps the buffer for a retry on the next
///   threshold crossing; redundant storage attempts are acceptable,
///   silent loss is not
/// - Cancellation drains the queue into the buffer and performs one
///   final bulk write before returning
pub struct EntrySink<R, S> {
    rx: mpsc::Receiver<R>,
    store: S,
    config: SinkConfig,
    buffer: Vec<R>,
    metrics: Arc<SinkMetrics>,
    name: String,
}

impl<R, S> EntrySink<R, S>
where
    R: Record + Storable,
    S: EntryStore<R>,
{
    /// Create a sink and its producer handle
    pub fn new(config: SinkConfig, store: S) -> (SinkHandle<R>, Self) {
        Self::with_name(config, store, R::KIND)
    }

    /// Create a sink with a custom name for logs and metrics
    pub fn with_name(
        config: SinkConfig,
        store: S,
        name: impl Into<String>,
    ) -> (SinkHandle<R>, Self) {
        let name = name.into();
        let metrics = Arc::new(SinkMetrics::new());
        let (tx, rx) = mpsc::channel(config.channel_size);

        let handle = SinkHandle {
            tx,
            metrics: Arc::clone(&metrics),
            name: name.clone(),
        };
        let capacity = config.flush_threshold();
        let sink = Self {
            rx,
            store,
            config,
            buffer: Vec::with_capacity(capacity),
            metrics,
            name,
        };
        (handle, sink)
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> SinkMetricsHandle {
        SinkMetricsHandle {
            id: self.name.clone(),
            kind: R::KIND,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Run the writer loop until the queue closes or `cancel` fires
    ///
    /// Consumes the sink. Returns the final metrics snapshot.
    pub async fn run(mut self, cancel: CancellationToken) -> SinkMetricsSnapshot {
        let threshold = self.config.flush_threshold();

        tracing::info!(
            sink = %self.name,
            kind = R::KIND,
            batch_size = self.config.batch_size,
            flush_threshold = threshold,
            channel_size = self.config.channel_size,
            "entry sink starting"
        );

        loop {
            tokio::select! {
                entry = self.rx.recv() => {
                    match entry {
                        Some(entry) => {
                            self.buffer.push(entry);
                            if self.buffer.len() >= threshold {
                                self.flush().await;
                            }
                        }
                        None => break, // producer closed the queue
                    }
                }
                _ = cancel.cancelled() => {
                    // Drain whatever is still queued into the buffer
                    while let Ok(entry) = self.rx.try_recv() {
                        self.buffer.push(entry);
                    }
                    break;
                }
            }
        }

        // Final bulk write so a clean shutdown drops nothing
        if !self.buffer.is_empty() {
            self.flush().await;
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            entries_submitted = snapshot.entries_submitted,
            entries_written = snapshot.entries_written,
            entries_invalid = snapshot.entries_invalid,
            entries_with_nan = snapshot.entries_with_nan,
            write_failures = snapshot.write_failures,
            flush_count = snapshot.flush_count,
            "entry sink shutting down"
        );
        snapshot
    }

    /// Bulk-write the buffer; on failure the buffer is retained so the
    /// entries are retried on the next flush
    async fn flush(&mut self) {
        let count = self.buffer.len();
        match self.store.put(&self.buffer).await {
            Ok(()) => {
                self.buffer.clear();
                self.metrics.record_written(count as u64);
                tracing::debug!(sink = %self.name, count, "flushed entries to store");
            }
            Err(err) => {
                self.metrics.record_write_failure();
                tracing::error!(
                    sink = %self.name,
                    count,
                    error = %err,
                    "bulk write failed, retaining buffer"
                );
            }
        }
    }
}

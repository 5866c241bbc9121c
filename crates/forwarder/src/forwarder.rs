//! Batch forwarder
//!
//! Receives batched bus messages, unbatches and decodes them, and pushes
//! the entries into the sink under a bounded-retry backpressure contract.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use backhaul_protocol::{Record, Storable, iter_frames};
use backhaul_sinks::{SinkHandle, SubmitError};

use crate::delivery::{Delivery, Disposition};
use crate::error::ForwardError;
use crate::metrics::{ForwarderMetrics, ForwarderMetricsHandle};

/// Configuration for a batch forwarder
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Total submit attempts per entry before the message is nacked
    pub max_retries: usize,

    /// Fixed sleep between submit attempts against a full sink
    pub retry_time: Duration,

    /// When set, an undecodable entry is dropped (and counted) instead
    /// of nacking the whole message. Used to unblock a poison message.
    pub entry_veto: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            retry_time: Duration::from_millis(100),
            entry_veto: false,
        }
    }
}

impl ForwarderConfig {
    /// Set the submit attempt limit
    #[must_use]
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the sleep between submit attempts
    #[must_use]
    pub fn with_retry_time(mut self, time: Duration) -> Self {
        self.retry_time = time;
        self
    }

    /// Enable or disable the entry veto
    #[must_use]
    pub fn with_entry_veto(mut self, veto: bool) -> Self {
        self.entry_veto = veto;
        self
    }
}

/// Destination the forwarder submits decoded entries to
///
/// `SinkHandle` is the production implementation; tests script their own.
pub trait EntrySubmitter<R>: Send + Sync + 'static {
    /// Offer one entry; retriable rejections give the entry back
    fn submit(&self, entry: R) -> Result<(), SubmitError<R>>;

    /// Close the destination's input, exactly once, after the last submit
    fn close(self);
}

impl<R: Record + Storable> EntrySubmitter<R> for SinkHandle<R> {
    fn submit(&self, entry: R) -> Result<(), SubmitError<R>> {
        SinkHandle::submit(self, entry)
    }

    fn close(self) {
        SinkHandle::close(self);
    }
}

/// Bus subscriber that unbatches, decodes, and forwards entries
///
/// # Design
///
/// - A framing error keeps the sub-payloads read before the corruption
///   point; the error is counted, not fatal
/// - A decode failure nacks the whole message unless the entry veto is
///   on, in which case the entry is dropped and counted
/// - A full sink is retried `max_retries` times with `retry_time` sleeps;
///   exhaustion nacks the message so the bus redelivers it later
/// - A message is acked only after every entry has been submitted
pub struct Forwarder<R, S> {
    sink: S,
    config: ForwarderConfig,
    metrics: Arc<ForwarderMetrics>,
    name: String,
    _record: PhantomData<fn(R)>,
}

impl<R, S> Forwarder<R, S>
where
    R: Record + Storable,
    S: EntrySubmitter<R>,
{
    /// Create a forwarder feeding the given sink
    pub fn new(config: ForwarderConfig, sink: S) -> Self {
        Self::with_name(config, sink, R::KIND)
    }

    /// Create a forwarder with a custom name for logs and metrics
    pub fn with_name(config: ForwarderConfig, sink: S, name: impl Into<String>) -> Self {
        Self {
            sink,
            config,
            metrics: Arc::new(ForwarderMetrics::new()),
            name: name.into(),
            _record: PhantomData,
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &ForwarderMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle implements `ForwarderMetricsProvider` and remains valid
    /// after `run()` consumes the forwarder.
    pub fn metrics_handle(&self) -> ForwarderMetricsHandle {
        ForwarderMetricsHandle {
            id: self.name.clone(),
            kind: R::KIND,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Handle one batched bus message and decide its disposition
    pub async fn handle_message(&self, data: &[u8]) -> Disposition {
        self.metrics.record_received();

        // Unbatch; a corrupt tail keeps whatever was read before it
        let mut frames = Vec::new();
        for frame in iter_frames(data) {
            match frame {
                Ok(frame) => frames.push(frame),
                Err(err) => {
                    self.metrics.record_framing_error();
                    tracing::error!(
                        forwarder = %self.name,
                        error = %err,
                        frames_read = frames.len(),
                        "failed to unbatch message"
                    );
                    break;
                }
            }
        }

        for frame in frames {
            let entry = match R::decode(frame) {
                Ok(entry) => entry,
                Err(err) => {
                    self.metrics.record_read_failure();
                    if self.config.entry_veto {
                        self.metrics.record_veto();
                        tracing::warn!(
                            forwarder = %self.name,
                            error = %err,
                            "vetoed unreadable entry"
                        );
                        continue;
                    }
                    tracing::error!(
                        forwarder = %self.name,
                        error = %err,
                        "could not read entry, nacking message"
                    );
                    self.metrics.record_settled(false);
                    return Disposition::Nack;
                }
            };

            if !self.submit_with_retry(entry).await {
                self.metrics.record_settled(false);
                return Disposition::Nack;
            }
        }

        self.metrics.record_settled(true);
        Disposition::Ack
    }

    /// Submit one entry, sleeping and retrying while the sink is full
    ///
    /// Returns false when the message should be nacked.
    async fn submit_with_retry(&self, entry: R) -> bool {
        let mut entry = entry;

        for attempt in 1..=self.config.max_retries {
            match self.sink.submit(entry) {
                Ok(()) => {
                    self.metrics.record_forwarded();
                    return true;
                }
                Err(SubmitError::QueueFull(returned)) => {
                    if attempt == self.config.max_retries {
                        break;
                    }
                    entry = returned;
                    tokio::time::sleep(self.config.retry_time).await;
                }
                Err(err) => {
                    tracing::error!(
                        forwarder = %self.name,
                        error = %err,
                        "could not submit entry"
                    );
                    return false;
                }
            }
        }

        self.metrics.record_retry_limit();
        tracing::error!(
            forwarder = %self.name,
            attempts = self.config.max_retries,
            "sink still full after retries, nacking message"
        );
        false
    }

    /// Run the receive loop until cancellation
    ///
    /// Consumes the forwarder. The delivery stream ending for any reason
    /// other than cancellation is fatal: the caller should exit the
    /// process and rely on supervision plus bus redelivery. On deliberate
    /// cancellation the sink input is closed so the final buffered
    /// entries flush before process exit.
    pub async fn run(
        self,
        mut receiver: mpsc::Receiver<Delivery>,
        cancel: CancellationToken,
    ) -> Result<(), ForwardError> {
        tracing::info!(
            forwarder = %self.name,
            kind = R::KIND,
            max_retries = self.config.max_retries,
            retry_time_ms = self.config.retry_time.as_millis() as u64,
            entry_veto = self.config.entry_veto,
            "forwarder starting"
        );

        let cancelled = loop {
            tokio::select! {
                _ = cancel.cancelled() => break true,
                delivery = receiver.recv() => {
                    match delivery {
                        Some(delivery) => {
                            let disposition = self.handle_message(delivery.data()).await;
                            delivery.settle(disposition);
                        }
                        None => break false,
                    }
                }
            }
        };

        let snapshot = self.metrics.snapshot();
        let Self { sink, name, .. } = self;

        if !cancelled {
            tracing::error!(
                forwarder = %name,
                "receive loop terminated unexpectedly"
            );
            return Err(ForwardError::ReceiveLoopTerminated);
        }

        // Deliberate shutdown: close the sink input so buffered entries
        // get their final flush
        sink.close();

        tracing::info!(
            forwarder = %name,
            messages_received = snapshot.messages_received,
            messages_acked = snapshot.messages_acked,
            messages_nacked = snapshot.messages_nacked,
            entries_forwarded = snapshot.entries_forwarded,
            framing_errors = snapshot.framing_errors,
            read_failures = snapshot.read_failures,
            "forwarder shutting down"
        );
        Ok(())
    }
}

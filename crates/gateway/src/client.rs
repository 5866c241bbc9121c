//! Gateway batch client
//!
//! Accumulates raw relay-update payloads and fans finished batches out to
//! every backend replica over HTTP.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use backhaul_protocol::FrameBuilder;

use crate::error::GatewayError;
use crate::metrics::{GatewayMetrics, GatewayMetricsHandle};

/// Configuration for the gateway batch client
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend replica addresses ("host:port"); every flush is POSTed to
    /// all of them independently
    pub backend_addresses: Vec<String>,

    /// Accumulated updates that trigger a flush
    pub batch_size: usize,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Intake queue capacity for the worker loop
    pub channel_buffer_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_addresses: Vec::new(),
            batch_size: 10,
            http_timeout: Duration::from_secs(1),
            channel_buffer_size: 100_000,
        }
    }
}

impl GatewayConfig {
    /// Set the backend replica addresses
    #[must_use]
    pub fn with_backend_addresses(mut self, addresses: Vec<String>) -> Self {
        self.backend_addresses = addresses;
        self
    }

    /// Set the flush threshold
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the HTTP timeout
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the intake queue capacity
    #[must_use]
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

struct Inner {
    config: GatewayConfig,
    http: reqwest::Client,
    buffer: Mutex<FrameBuilder>,
    in_flight: AtomicUsize,
    flush_done: Notify,
    metrics: Arc<GatewayMetrics>,
    name: String,
}

/// Batched HTTP fan-out client for relay updates
///
/// # Design
///
/// - One mutex-guarded accumulation buffer; the critical section is
///   append-or-swap only, network I/O always happens after the buffer
///   has been swapped out, so a flush never blocks `submit` calls
///   against the new buffer
/// - Fan-out is independent per destination: a failed backend is counted
///   and logged, the other backends still get the batch
/// - Delivery to different backends is unordered relative to each other
///
/// Cloning is cheap; clones share the buffer and metrics.
#[derive(Clone)]
pub struct GatewayBatchClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for GatewayBatchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBatchClient")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl GatewayBatchClient {
    /// Create a client
    ///
    /// Fails when no backend addresses are configured or the HTTP client
    /// cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_name(config, "relay_gateway")
    }

    /// Create a client with a custom name for logs and metrics
    pub fn with_name(config: GatewayConfig, name: impl Into<String>) -> Result<Self, GatewayError> {
        if config.backend_addresses.is_empty() {
            return Err(GatewayError::NoBackends);
        }

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                buffer: Mutex::new(FrameBuilder::new()),
                in_flight: AtomicUsize::new(0),
                flush_done: Notify::new(),
                metrics: Arc::new(GatewayMetrics::new()),
                name: name.into(),
                config,
            }),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> GatewayMetricsHandle {
        GatewayMetricsHandle {
            id: self.inner.name.clone(),
            metrics: Arc::clone(&self.inner.metrics),
        }
    }

    /// Number of updates currently accumulated
    pub fn buffered_count(&self) -> usize {
        self.inner.buffer.lock().message_count()
    }

    /// Submit one raw update payload
    ///
    /// Frames and appends under the buffer lock; a submit that crosses
    /// the batch-size threshold swaps the buffer out and spawns its
    /// delivery, without blocking the caller on network I/O.
    pub fn submit(&self, update: &[u8]) {
        self.inner.metrics.record_received();

        let batch = {
            let mut buffer = self.inner.buffer.lock();
            buffer.push(update);
            if buffer.message_count() >= self.inner.config.batch_size {
                let count = buffer.message_count();
                Some((buffer.take(), count))
            } else {
                None
            }
        };

        if let Some((batch, count)) = batch {
            let client = self.clone();
            self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                client.deliver(batch, count).await;
                client.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
                client.inner.flush_done.notify_waiters();
            });
        }
    }

    /// Flush whatever is buffered, regardless of the threshold, and wait
    /// for delivery to complete
    pub async fn flush(&self) {
        let batch = {
            let mut buffer = self.inner.buffer.lock();
            if buffer.is_empty() {
                None
            } else {
                let count = buffer.message_count();
                Some((buffer.take(), count))
            }
        };

        if let Some((batch, count)) = batch {
            self.deliver(batch, count).await;
        }
    }

    /// Wait until every spawned threshold-flush has completed
    async fn drain(&self) {
        loop {
            let notified = self.inner.flush_done.notified();
            if self.inner.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// POST one finished batch to every backend concurrently
    async fn deliver(&self, batch: Bytes, count: usize) {
        let mut sends = Vec::with_capacity(self.inner.config.backend_addresses.len());

        for address in &self.inner.config.backend_addresses {
            let url = format!("http://{}/relay_update", address);
            let client = self.clone();
            let body = batch.clone();
            sends.push(tokio::spawn(async move {
                client.send_to_backend(&url, body).await;
            }));
        }

        for send in sends {
            let _ = send.await;
        }

        self.inner.metrics.record_flush(count as u64);
        tracing::debug!(
            gateway = %self.inner.name,
            updates = count,
            bytes = batch.len(),
            backends = self.inner.config.backend_addresses.len(),
            "flushed update batch"
        );
    }

    /// POST one batch to one backend; failure is counted, never fatal
    async fn send_to_backend(&self, url: &str, body: Bytes) {
        let result = self
            .inner
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                self.inner.metrics.record_backend_send();
            }
            Ok(response) => {
                self.inner.metrics.record_backend_failure();
                tracing::error!(
                    gateway = %self.inner.name,
                    url,
                    status = %response.status(),
                    "backend rejected update batch"
                );
            }
            Err(err) => {
                self.inner.metrics.record_backend_failure();
                tracing::error!(
                    gateway = %self.inner.name,
                    url,
                    error = %err,
                    "could not send update batch to backend"
                );
            }
        }
    }

    /// Run the intake worker until cancellation
    ///
    /// Drains raw update payloads from `receiver` (the HTTP handler side
    /// enqueues them) and submits each one. On cancellation, or when the
    /// intake channel closes, performs exactly one final flush of
    /// whatever remains buffered and waits for in-flight deliveries, so
    /// no accumulated batch is lost on graceful termination.
    pub async fn run(self, mut receiver: mpsc::Receiver<Bytes>, cancel: CancellationToken) {
        tracing::info!(
            gateway = %self.inner.name,
            backends = self.inner.config.backend_addresses.len(),
            batch_size = self.inner.config.batch_size,
            http_timeout_ms = self.inner.config.http_timeout.as_millis() as u64,
            "gateway batch client starting"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Drain updates already queued before the final flush
                    while let Ok(update) = receiver.try_recv() {
                        self.submit(&update);
                    }
                    break;
                }
                update = receiver.recv() => {
                    match update {
                        Some(update) => self.submit(&update),
                        None => break,
                    }
                }
            }
        }

        // Exactly one final flush, then wait out spawned deliveries
        self.flush().await;
        self.drain().await;

        let snapshot = self.inner.metrics.snapshot();
        tracing::info!(
            gateway = %self.inner.name,
            updates_received = snapshot.updates_received,
            updates_flushed = snapshot.updates_flushed,
            batches_flushed = snapshot.batches_flushed,
            backend_sends = snapshot.backend_sends,
            backend_send_failures = snapshot.backend_send_failures,
            "gateway batch client shutting down"
        );
    }
}

//! Sharded batch publisher
//!
//! N independent shards, each owning one framed accumulation buffer and
//! one dedicated publish task. All entries for a session land on the same
//! shard, so per-shard append order preserves session-local order without
//! any global lock. There is no ordering guarantee across shards.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use backhaul_protocol::{FrameBuilder, Record};

use crate::bus::BusPublisher;
use crate::error::PublishError;
use crate::metrics::{PublisherMetrics, PublisherMetricsHandle};

/// Configuration for a sharded publisher
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Number of independent shards
    pub client_count: usize,

    /// Entries a shard accepts before refusing with `BufferFull`;
    /// crossing it is also the first flush condition
    pub count_threshold: usize,

    /// Minimum buffered bytes before a flush fires (the second flush
    /// condition; both must hold)
    pub min_buffer_bytes: usize,

    /// Capacity of each shard's outbound publish queue
    pub publish_queue_size: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            client_count: 1,
            count_threshold: 100,
            min_buffer_bytes: 1024,
            publish_queue_size: 4096,
        }
    }
}

impl PublisherConfig {
    /// Set the shard count
    #[must_use]
    pub fn with_client_count(mut self, count: usize) -> Self {
        self.client_count = count;
        self
    }

    /// Set the buffered entry count threshold
    #[must_use]
    pub fn with_count_threshold(mut self, threshold: usize) -> Self {
        self.count_threshold = threshold;
        self
    }

    /// Set the minimum buffered bytes before a flush
    #[must_use]
    pub fn with_min_buffer_bytes(mut self, bytes: usize) -> Self {
        self.min_buffer_bytes = bytes;
        self
    }

    /// Set the per-shard publish queue capacity
    #[must_use]
    pub fn with_publish_queue_size(mut self, size: usize) -> Self {
        self.publish_queue_size = size;
        self
    }
}

/// One buffering unit of the publisher
struct Shard {
    buffer: Mutex<FrameBuilder>,
    publish_tx: mpsc::Sender<Bytes>,
}

/// Sharded batch publisher for one record kind
///
/// # Design
///
/// - `submit` encodes outside any lock, then appends under the target
///   shard's mutex; the critical section is append-or-swap only
/// - A flush cuts the buffer out under the lock and hands the finished
///   batch to the shard's publish task outside the lock, so slow bus I/O
///   never blocks producers queuing onto the same shard
/// - `close` stops the publish tasks without flushing; callers that need
///   at-least-once delivery on shutdown call `flush_all` first
pub struct ShardedPublisher<R: Record> {
    shards: Vec<Shard>,
    config: PublisherConfig,
    metrics: Arc<PublisherMetrics>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    name: String,
    _record: PhantomData<fn(R)>,
}

impl<R: Record> ShardedPublisher<R> {
    /// Create a publisher and spawn one publish task per shard
    ///
    /// # Panics
    ///
    /// Panics if `config.client_count` is zero.
    pub fn new(config: PublisherConfig, bus: Arc<dyn BusPublisher>) -> Self {
        Self::with_name(config, bus, R::KIND)
    }

    /// Create a publisher with a custom name for logs and metrics
    pub fn with_name(
        config: PublisherConfig,
        bus: Arc<dyn BusPublisher>,
        name: impl Into<String>,
    ) -> Self {
        assert!(config.client_count > 0, "publisher requires at least one shard");

        let name = name.into();
        let metrics = Arc::new(PublisherMetrics::new());
        let cancel = CancellationToken::new();

        let mut shards = Vec::with_capacity(config.client_count);
        let mut tasks = Vec::with_capacity(config.client_count);

        for shard_index in 0..config.client_count {
            let (publish_tx, publish_rx) = mpsc::channel(config.publish_queue_size);
            shards.push(Shard {
                buffer: Mutex::new(FrameBuilder::new()),
                publish_tx,
            });
            tasks.push(tokio::spawn(publish_loop(
                name.clone(),
                shard_index,
                publish_rx,
                Arc::clone(&bus),
                Arc::clone(&metrics),
                cancel.clone(),
            )));
        }

        tracing::info!(
            publisher = %name,
            kind = R::KIND,
            shards = config.client_count,
            count_threshold = config.count_threshold,
            min_buffer_bytes = config.min_buffer_bytes,
            "sharded publisher starting"
        );

        Self {
            shards,
            config,
            metrics,
            cancel,
            tasks,
            name,
            _record: PhantomData,
        }
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &PublisherMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle implements `PublisherMetricsProvider` and remains valid
    /// after `close()` consumes the publisher.
    pub fn metrics_handle(&self) -> PublisherMetricsHandle {
        PublisherMetricsHandle {
            id: self.name.clone(),
            kind: R::KIND,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Get the number of shards
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Number of entries currently buffered on one shard
    pub fn buffered_count(&self, shard_index: usize) -> usize {
        self.shards[shard_index].buffer.lock().message_count()
    }

    /// Pick the shard for a record
    #[inline]
    fn shard_index(&self, record: &R) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        record.shard_key().hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Submit one entry
    ///
    /// Never blocks on network I/O: the entry is appended to the target
    /// shard's buffer, or refused with [`PublishError::BufferFull`] when
    /// the shard is at its count threshold. A submit that crosses both
    /// flush thresholds cuts the buffer and hands it to the shard's
    /// publish task before returning.
    pub fn submit(&self, record: &R) -> Result<(), PublishError> {
        let payload = record.encode().inspect_err(|_| {
            self.metrics.record_encode_failure();
        })?;

        let shard = &self.shards[self.shard_index(record)];

        let batch = {
            let mut buffer = shard.buffer.lock();

            if buffer.message_count() >= self.config.count_threshold {
                self.metrics.record_rejected();
                return Err(PublishError::BufferFull);
            }

            buffer.push(&payload);
            self.metrics.record_submitted();

            if buffer.message_count() >= self.config.count_threshold
                && buffer.len_bytes() >= self.config.min_buffer_bytes
            {
                Some(buffer.take())
            } else {
                None
            }
        };

        if let Some(batch) = batch {
            self.hand_off(shard, batch);
        }

        Ok(())
    }

    /// Force-publish one shard's buffer even if thresholds are not met
    pub fn flush_shard(&self, shard_index: usize) {
        let shard = &self.shards[shard_index];
        let batch = {
            let mut buffer = shard.buffer.lock();
            if buffer.is_empty() {
                return;
            }
            buffer.take()
        };
        self.hand_off(shard, batch);
    }

    /// Force-publish every shard's buffer (shutdown/drain path)
    pub fn flush_all(&self) {
        for shard_index in 0..self.shards.len() {
            self.flush_shard(shard_index);
        }
    }

    /// Hand a finished batch to the shard's publish task, outside the
    /// buffer lock
    fn hand_off(&self, shard: &Shard, batch: Bytes) {
        if let Err(err) = shard.publish_tx.try_send(batch) {
            self.metrics.record_publish_failure();
            tracing::error!(
                publisher = %self.name,
                error = %err,
                "publish queue rejected batch"
            );
        }
    }

    /// Stop the per-shard publish tasks and halt the publisher
    ///
    /// Does not implicitly flush; call `flush_all` first when buffered
    /// entries must reach the bus before shutdown. Batches already handed
    /// to a publish task are drained before the task exits.
    pub async fn close(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            publisher = %self.name,
            entries_submitted = snapshot.entries_submitted,
            entries_rejected = snapshot.entries_rejected,
            batches_published = snapshot.batches_published,
            bytes_published = snapshot.bytes_published,
            publish_failures = snapshot.publish_failures,
            "sharded publisher closed"
        );
    }
}

/// Per-shard publish task: drains finished batches and performs the only
/// blocking bus I/O in the publisher
async fn publish_loop(
    name: String,
    shard_index: usize,
    mut publish_rx: mpsc::Receiver<Bytes>,
    bus: Arc<dyn BusPublisher>,
    metrics: Arc<PublisherMetrics>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            batch = publish_rx.recv() => {
                match batch {
                    Some(batch) => publish_one(&name, shard_index, &bus, &metrics, batch).await,
                    None => break,
                }
            }
            _ = cancel.cancelled() => {
                // Drain batches already handed off, then stop
                while let Ok(batch) = publish_rx.try_recv() {
                    publish_one(&name, shard_index, &bus, &metrics, batch).await;
                }
                break;
            }
        }
    }

    tracing::debug!(publisher = %name, shard = shard_index, "publish task stopping");
}

async fn publish_one(
    name: &str,
    shard_index: usize,
    bus: &Arc<dyn BusPublisher>,
    metrics: &Arc<PublisherMetrics>,
    batch: Bytes,
) {
    let bytes = batch.len() as u64;
    match bus.publish(batch).await {
        Ok(()) => {
            metrics.record_published(bytes);
            tracing::debug!(
                publisher = %name,
                shard = shard_index,
                bytes,
                "published batch"
            );
        }
        Err(err) => {
            metrics.record_publish_failure();
            tracing::error!(
                publisher = %name,
                shard = shard_index,
                error = %err,
                "failed to publish batch"
            );
        }
    }
}

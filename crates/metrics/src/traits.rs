//! Metrics provider traits
//!
//! Traits for pipeline components to expose their metrics to an embedding
//! service's reporter without the reporter knowing the concrete types.
//! The concrete atomic counter structs live next to the components that
//! update them; this crate defines only the snapshot shapes and the
//! provider contracts.

/// Point-in-time snapshot of sharded publisher metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PublisherMetricsSnapshot {
    /// Entries accepted into a shard buffer
    pub entries_submitted: u64,
    /// Entries refused because the shard buffer was full
    pub entries_rejected: u64,
    /// Entries that failed to encode
    pub encode_failures: u64,
    /// Batches handed to the bus
    pub batches_published: u64,
    /// Bytes handed to the bus
    pub bytes_published: u64,
    /// Publishes the bus reported as failed
    pub publish_failures: u64,
}

/// Trait for sharded publishers to provide metrics to a reporter
pub trait PublisherMetricsProvider: Send + Sync {
    /// Unique identifier for this publisher instance
    fn publisher_id(&self) -> &str;

    /// Record kind flowing through this publisher ("billing", ...)
    fn record_kind(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> PublisherMetricsSnapshot;
}

/// Point-in-time snapshot of batch forwarder metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct ForwarderMetricsSnapshot {
    /// Bus messages received
    pub messages_received: u64,
    /// Bus messages acked
    pub messages_acked: u64,
    /// Bus messages nacked
    pub messages_nacked: u64,
    /// Entries decoded and submitted to the sink
    pub entries_forwarded: u64,
    /// Batches that failed to unframe
    pub framing_errors: u64,
    /// Entries that failed to decode
    pub read_failures: u64,
    /// Undecodable entries dropped because entry veto is on
    pub entries_vetoed: u64,
    /// Messages nacked after exhausting sink submit retries
    pub retry_limit_reached: u64,
}

/// Trait for batch forwarders to provide metrics to a reporter
pub trait ForwarderMetricsProvider: Send + Sync {
    /// Unique identifier for this forwarder instance
    fn forwarder_id(&self) -> &str;

    /// Record kind flowing through this forwarder
    fn record_kind(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> ForwarderMetricsSnapshot;
}

/// Point-in-time snapshot of buffering sink metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct SinkMetricsSnapshot {
    /// Entries offered to the sink
    pub entries_submitted: u64,
    /// Entries rejected by validation
    pub entries_invalid: u64,
    /// Entries carrying at least one NaN/Inf float
    pub entries_with_nan: u64,
    /// Entries refused because the queue was full
    pub queue_full_rejections: u64,
    /// Entries written to the store
    pub entries_written: u64,
    /// Bulk writes that failed
    pub write_failures: u64,
    /// Bulk writes performed
    pub flush_count: u64,
}

/// Trait for buffering sinks to provide metrics to a reporter
pub trait SinkMetricsProvider: Send + Sync {
    /// Unique identifier for this sink instance
    fn sink_id(&self) -> &str;

    /// Record kind flowing through this sink
    fn record_kind(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SinkMetricsSnapshot;
}

/// Point-in-time snapshot of gateway batch client metrics
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct GatewayMetricsSnapshot {
    /// Raw update payloads received
    pub updates_received: u64,
    /// Updates refused because the intake queue was full
    pub updates_dropped: u64,
    /// Updates flushed to the backends
    pub updates_flushed: u64,
    /// Batches flushed
    pub batches_flushed: u64,
    /// Per-backend sends that succeeded
    pub backend_sends: u64,
    /// Per-backend sends that failed (transport error or non-200)
    pub backend_send_failures: u64,
}

/// Trait for gateway batch clients to provide metrics to a reporter
pub trait GatewayMetricsProvider: Send + Sync {
    /// Unique identifier for this gateway client instance
    fn gateway_id(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> GatewayMetricsSnapshot;
}

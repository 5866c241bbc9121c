//! Tests for the sharded batch publisher

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use backhaul_protocol::{BeaconEntry, Record, split_frames};

use crate::bus::{BusError, BusPublisher};
use crate::error::PublishError;
use crate::publisher::{PublisherConfig, ShardedPublisher};

/// Bus double that records every published batch
#[derive(Default)]
struct MockBus {
    batches: Mutex<Vec<Bytes>>,
    fail: std::sync::atomic::AtomicBool,
}

impl MockBus {
    fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn batches(&self) -> Vec<Bytes> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BusPublisher for MockBus {
    async fn publish(&self, payload: Bytes) -> Result<(), BusError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(BusError::Transport("mock failure".into()));
        }
        self.batches.lock().unwrap().push(payload);
        Ok(())
    }
}

fn entry(session_id: u64) -> BeaconEntry {
    BeaconEntry {
        session_id,
        user_hash: 1,
        buyer_id: 1,
        ..Default::default()
    }
}

async fn wait_for_batches(bus: &MockBus, count: usize) {
    for _ in 0..200 {
        if bus.batch_count() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "timed out waiting for {} batches, saw {}",
        count,
        bus.batch_count()
    );
}

// =============================================================================
// Flush threshold
// =============================================================================

#[tokio::test]
async fn test_below_threshold_never_publishes() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(3)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    publisher.submit(&entry(1)).unwrap();
    publisher.submit(&entry(1)).unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(bus.batch_count(), 0);
    assert_eq!(publisher.buffered_count(0), 2);
}

#[tokio::test]
async fn test_crossing_threshold_publishes_exactly_once() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(3)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    for _ in 0..3 {
        publisher.submit(&entry(1)).unwrap();
    }

    wait_for_batches(&bus, 1).await;
    assert_eq!(bus.batch_count(), 1);
    // Shard buffer is empty after the flush
    assert_eq!(publisher.buffered_count(0), 0);

    let batches = bus.batches();
    let frames = split_frames(&batches[0]).unwrap();
    assert_eq!(frames.len(), 3);
}

#[tokio::test]
async fn test_two_entry_batch_decodes_in_submission_order() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(2)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    let first = BeaconEntry {
        session_id: 10,
        timestamp: 111,
        user_hash: 1,
        buyer_id: 1,
        ..Default::default()
    };
    let second = BeaconEntry {
        session_id: 10,
        timestamp: 222,
        user_hash: 1,
        buyer_id: 1,
        ..Default::default()
    };

    publisher.submit(&first).unwrap();
    publisher.submit(&second).unwrap();

    wait_for_batches(&bus, 1).await;
    let batches = bus.batches();
    let frames = split_frames(&batches[0]).unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(BeaconEntry::decode(frames[0]).unwrap(), first);
    assert_eq!(BeaconEntry::decode(frames[1]).unwrap(), second);
}

// =============================================================================
// AND flush policy + buffer-full
// =============================================================================

#[tokio::test]
async fn test_byte_threshold_holds_back_flush() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(2)
        .with_min_buffer_bytes(1024 * 1024);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    publisher.submit(&entry(1)).unwrap();
    publisher.submit(&entry(1)).unwrap();

    // Count threshold met but byte threshold not: no flush, and the
    // shard refuses further entries
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(bus.batch_count(), 0);

    let err = publisher.submit(&entry(1)).unwrap_err();
    assert!(matches!(err, PublishError::BufferFull));
    assert!(err.is_retriable());
    assert_eq!(publisher.metrics().snapshot().entries_rejected, 1);
}

#[tokio::test]
async fn test_flush_all_ignores_thresholds() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(100)
        .with_min_buffer_bytes(1024 * 1024);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    publisher.submit(&entry(1)).unwrap();
    publisher.flush_all();

    wait_for_batches(&bus, 1).await;
    let batches = bus.batches();
    let frames = split_frames(&batches[0]).unwrap();
    assert_eq!(frames.len(), 1);
}

#[tokio::test]
async fn test_flush_all_on_empty_buffers_is_a_no_op() {
    let bus = Arc::new(MockBus::default());
    let publisher =
        ShardedPublisher::<BeaconEntry>::new(PublisherConfig::default(), bus.clone());

    publisher.flush_all();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(bus.batch_count(), 0);
}

// =============================================================================
// Sharding
// =============================================================================

#[tokio::test]
async fn test_all_entries_reach_bus_across_shards() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(4)
        .with_count_threshold(1000)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    let total = 64;
    for i in 0..total {
        publisher.submit(&entry(i as u64 + 1)).unwrap();
    }
    publisher.flush_all();

    wait_for_batches(&bus, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let frames: usize = bus
        .batches()
        .iter()
        .map(|b| split_frames(b).unwrap().len())
        .sum();
    assert_eq!(frames, total);
}

#[tokio::test]
async fn test_same_session_stays_on_one_shard() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(8)
        .with_count_threshold(1000)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    for _ in 0..10 {
        publisher.submit(&entry(42)).unwrap();
    }

    let occupied: Vec<usize> = (0..publisher.shard_count())
        .filter(|&i| publisher.buffered_count(i) > 0)
        .collect();
    assert_eq!(occupied.len(), 1);
    assert_eq!(publisher.buffered_count(occupied[0]), 10);
}

// =============================================================================
// Close + errors
// =============================================================================

#[tokio::test]
async fn test_close_without_flush_drops_buffered_entries() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(100);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    publisher.submit(&entry(1)).unwrap();
    publisher.close().await;

    assert_eq!(bus.batch_count(), 0);
}

#[tokio::test]
async fn test_flush_then_close_delivers_buffered_entries() {
    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(100);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    publisher.submit(&entry(1)).unwrap();
    publisher.flush_all();
    publisher.close().await;

    assert_eq!(bus.batch_count(), 1);
}

#[tokio::test]
async fn test_bus_failure_is_counted_not_returned() {
    let bus = Arc::new(MockBus::default());
    bus.fail.store(true, std::sync::atomic::Ordering::Relaxed);

    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(1)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());

    // Submit succeeds even though the bus is down: transport errors are
    // asynchronous
    publisher.submit(&entry(1)).unwrap();

    for _ in 0..200 {
        if publisher.metrics().snapshot().publish_failures > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(publisher.metrics().snapshot().publish_failures, 1);
    assert_eq!(bus.batch_count(), 0);
}

#[tokio::test]
async fn test_encode_failure_is_counted() {
    let bus = Arc::new(MockBus::default());
    let publisher =
        ShardedPublisher::<BeaconEntry>::new(PublisherConfig::default(), bus.clone());

    let mut bad = entry(1);
    bad.platform_type = 99;
    let err = publisher.submit(&bad).unwrap_err();
    assert!(matches!(err, PublishError::Encode(_)));
    assert!(!err.is_retriable());
    assert_eq!(publisher.metrics().snapshot().encode_failures, 1);
}

#[tokio::test]
async fn test_metrics_handle_outlives_publisher() {
    use backhaul_metrics::PublisherMetricsProvider;

    let bus = Arc::new(MockBus::default());
    let config = PublisherConfig::default()
        .with_client_count(1)
        .with_count_threshold(1)
        .with_min_buffer_bytes(0);
    let publisher = ShardedPublisher::<BeaconEntry>::new(config, bus.clone());
    let handle = publisher.metrics_handle();

    publisher.submit(&entry(1)).unwrap();
    wait_for_batches(&bus, 1).await;
    publisher.close().await;

    assert_eq!(handle.record_kind(), "beacon");
    assert_eq!(handle.snapshot().batches_published, 1);
}

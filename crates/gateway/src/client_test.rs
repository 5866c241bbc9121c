//! Tests for the gateway batch client
//!
//! Backends are real HTTP servers bound to ephemeral local ports.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use backhaul_protocol::split_frames;

use crate::client::{GatewayBatchClient, GatewayConfig};
use crate::error::GatewayError;

/// Recording backend: stores every POSTed body, returns the given status
async fn start_backend(status: StatusCode) -> (String, Arc<Mutex<Vec<Bytes>>>) {
    let bodies: Arc<Mutex<Vec<Bytes>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&bodies);

    let app = Router::new().route(
        "/relay_update",
        post(move |body: Bytes| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().unwrap().push(body);
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, bodies)
}

fn config(addresses: Vec<String>, batch_size: usize) -> GatewayConfig {
    GatewayConfig::default()
        .with_backend_addresses(addresses)
        .with_batch_size(batch_size)
        .with_http_timeout(Duration::from_secs(2))
}

async fn wait_for_bodies(bodies: &Arc<Mutex<Vec<Bytes>>>, count: usize) {
    for _ in 0..400 {
        if bodies.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "timed out waiting for {} bodies, saw {}",
        count,
        bodies.lock().unwrap().len()
    );
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn test_requires_backend_addresses() {
    let err = GatewayBatchClient::new(GatewayConfig::default()).unwrap_err();
    assert!(matches!(err, GatewayError::NoBackends));
}

// =============================================================================
// Threshold flush + fan-out
// =============================================================================

#[tokio::test]
async fn test_threshold_flush_delivers_framed_batch() {
    let (address, bodies) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address], 2)).unwrap();

    client.submit(b"update-one");
    assert_eq!(client.buffered_count(), 1);

    client.submit(b"update-two");
    wait_for_bodies(&bodies, 1).await;

    // Buffer was swapped out at the threshold
    assert_eq!(client.buffered_count(), 0);

    let received = bodies.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let frames = split_frames(&received[0]).unwrap();
    assert_eq!(frames, vec![b"update-one".as_slice(), b"update-two".as_slice()]);
}

#[tokio::test]
async fn test_fan_out_reaches_every_backend() {
    let (address_a, bodies_a) = start_backend(StatusCode::OK).await;
    let (address_b, bodies_b) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address_a, address_b], 1)).unwrap();

    client.submit(b"update");

    wait_for_bodies(&bodies_a, 1).await;
    wait_for_bodies(&bodies_b, 1).await;
    assert_eq!(bodies_a.lock().unwrap()[0], bodies_b.lock().unwrap()[0]);
    assert_eq!(client.metrics().snapshot().backend_sends, 2);
}

#[tokio::test]
async fn test_failing_backend_does_not_block_the_healthy_one() {
    let (healthy, bodies) = start_backend(StatusCode::OK).await;
    // Nothing listens on this port; connections are refused
    let dead = "127.0.0.1:1".to_string();
    let client = GatewayBatchClient::new(config(vec![dead, healthy], 1)).unwrap();

    client.submit(b"first");
    client.submit(b"second");

    wait_for_bodies(&bodies, 2).await;
    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.backend_sends, 2);
    assert_eq!(snapshot.backend_send_failures, 2);
    assert_eq!(snapshot.batches_flushed, 2);
}

#[tokio::test]
async fn test_non_200_counts_as_failure() {
    let (address, bodies) = start_backend(StatusCode::INTERNAL_SERVER_ERROR).await;
    let client = GatewayBatchClient::new(config(vec![address], 1)).unwrap();

    client.submit(b"update");

    wait_for_bodies(&bodies, 1).await;
    let snapshot = client.metrics().snapshot();
    assert_eq!(snapshot.backend_sends, 0);
    assert_eq!(snapshot.backend_send_failures, 1);
}

// =============================================================================
// Explicit flush + worker shutdown
// =============================================================================

#[tokio::test]
async fn test_flush_below_threshold() {
    let (address, bodies) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address], 100)).unwrap();

    client.submit(b"lonely-update");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(bodies.lock().unwrap().is_empty());

    client.flush().await;

    let received = bodies.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(split_frames(&received[0]).unwrap().len(), 1);
}

#[tokio::test]
async fn test_flush_with_empty_buffer_sends_nothing() {
    let (address, bodies) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address], 10)).unwrap();

    client.flush().await;
    assert!(bodies.lock().unwrap().is_empty());
    assert_eq!(client.metrics().snapshot().batches_flushed, 0);
}

#[tokio::test]
async fn test_worker_flushes_remainder_on_cancel() {
    let (address, bodies) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address], 100)).unwrap();

    let (tx, rx) = mpsc::channel::<Bytes>(16);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(client.clone().run(rx, cancel.clone()));

    tx.send(Bytes::from_static(b"queued-one")).await.unwrap();
    tx.send(Bytes::from_static(b"queued-two")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    cancel.cancel();
    worker.await.unwrap();

    // One final flush carried both updates
    let received = bodies.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(split_frames(&received[0]).unwrap().len(), 2);
    assert_eq!(client.metrics().snapshot().batches_flushed, 1);
}

#[tokio::test]
async fn test_worker_mixes_threshold_and_final_flush() {
    let (address, bodies) = start_backend(StatusCode::OK).await;
    let client = GatewayBatchClient::new(config(vec![address], 2)).unwrap();

    let (tx, rx) = mpsc::channel::<Bytes>(16);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(client.clone().run(rx, cancel.clone()));

    for payload in [&b"a"[..], b"b", b"c"] {
        tx.send(Bytes::copy_from_slice(payload)).await.unwrap();
    }
    wait_for_bodies(&bodies, 1).await; // threshold flush of a+b

    cancel.cancel();
    worker.await.unwrap();

    wait_for_bodies(&bodies, 2).await; // final flush of c
    let received = bodies.lock().unwrap().clone();
    assert_eq!(split_frames(&received[0]).unwrap().len(), 2);
    assert_eq!(split_frames(&received[1]).unwrap().len(), 1);
}

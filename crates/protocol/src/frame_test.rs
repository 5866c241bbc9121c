//! Tests for batch framing

use crate::frame::{FrameBuilder, split_frames};
use crate::CodecError;

// =============================================================================
// FrameBuilder
// =============================================================================

#[test]
fn test_builder_starts_empty() {
    let builder = FrameBuilder::new();
    assert!(builder.is_empty());
    assert_eq!(builder.message_count(), 0);
    assert_eq!(builder.len_bytes(), 0);
}

#[test]
fn test_push_counts_prefix_bytes() {
    let mut builder = FrameBuilder::new();
    builder.push(b"hello");
    assert_eq!(builder.message_count(), 1);
    assert_eq!(builder.len_bytes(), 4 + 5);
}

#[test]
fn test_take_resets_builder() {
    let mut builder = FrameBuilder::new();
    builder.push(b"one");
    builder.push(b"two");

    let batch = builder.take();
    assert_eq!(batch.len(), 2 * 4 + 3 + 3);
    assert!(builder.is_empty());
    assert_eq!(builder.len_bytes(), 0);

    // The builder is reusable after take
    builder.push(b"three");
    assert_eq!(builder.message_count(), 1);
}

// =============================================================================
// Round-trip
// =============================================================================

#[test]
fn test_roundtrip_preserves_order() {
    let messages: Vec<&[u8]> = vec![b"alpha", b"", b"gamma", b"d"];

    let mut builder = FrameBuilder::new();
    for msg in &messages {
        builder.push(msg);
    }
    let batch = builder.take();

    let frames = split_frames(&batch).unwrap();
    assert_eq!(frames, messages);
}

#[test]
fn test_split_empty_batch() {
    let frames = split_frames(&[]).unwrap();
    assert!(frames.is_empty());
}

#[test]
fn test_roundtrip_single_large_message() {
    let payload = vec![0xabu8; 100_000];
    let mut builder = FrameBuilder::with_capacity(payload.len() + 4);
    builder.push(&payload);
    let batch = builder.take();

    let frames = split_frames(&batch).unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0], payload.as_slice());
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_truncated_length_prefix() {
    let err = split_frames(&[1, 0, 0]).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TruncatedFrame {
            offset: 0,
            need: 4,
            remaining: 3,
        }
    ));
}

#[test]
fn test_length_prefix_overruns_buffer() {
    let mut builder = FrameBuilder::new();
    builder.push(b"payload");
    let batch = builder.take();

    // Drop the final byte so the last frame's length overruns
    let err = split_frames(&batch[..batch.len() - 1]).unwrap_err();
    assert!(matches!(err, CodecError::TruncatedFrame { .. }));
}

#[test]
fn test_trailing_garbage_after_valid_frame() {
    let mut builder = FrameBuilder::new();
    builder.push(b"ok");
    let mut batch = builder.take().to_vec();
    batch.extend_from_slice(&[9, 9]); // not even a full length prefix

    let err = split_frames(&batch).unwrap_err();
    assert!(matches!(err, CodecError::TruncatedFrame { .. }));
}

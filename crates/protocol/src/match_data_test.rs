//! Tests for MatchDataEntry codec

use crate::match_data::{
    MATCH_DATA_ENTRY_VERSION, MatchDataEntry, MAX_MATCH_VALUES, MAX_SERVER_ADDRESS_LENGTH,
};
use crate::record::{Record, Storable};
use crate::CodecError;

fn test_entry() -> MatchDataEntry {
    let mut entry = MatchDataEntry {
        version: MATCH_DATA_ENTRY_VERSION,
        timestamp: 1_700_000_123,
        buyer_id: 42,
        server_address: "10.2.3.4:40000".to_string(),
        datacenter_id: 9,
        user_hash: 0xabcd,
        session_id: 0x1111_2222_3333_4444,
        match_id: 0x5555_6666,
        num_match_values: 5,
        match_duration: 900,
        ..Default::default()
    };
    for i in 0..entry.num_match_values as usize {
        entry.match_values[i] = i as f64 * 1.5;
    }
    entry
}

// =============================================================================
// Round-trip
// =============================================================================

#[test]
fn test_roundtrip_empty() {
    let entry = MatchDataEntry {
        session_id: 1,
        buyer_id: 1,
        match_id: 1,
        ..Default::default()
    };
    let data = entry.encode().unwrap();
    assert_eq!(entry, MatchDataEntry::decode(&data).unwrap());
}

#[test]
fn test_roundtrip_full_match_values() {
    let mut entry = test_entry();
    entry.num_match_values = MAX_MATCH_VALUES as i32;
    for i in 0..MAX_MATCH_VALUES {
        entry.match_values[i] = i as f64;
    }
    let data = entry.encode().unwrap();
    assert_eq!(entry, MatchDataEntry::decode(&data).unwrap());
}

// =============================================================================
// Version gating
// =============================================================================

#[test]
fn test_v0_payload_leaves_duration_zero() {
    let mut entry = test_entry();
    entry.version = 0;
    let data = entry.encode().unwrap();
    let decoded = MatchDataEntry::decode(&data).unwrap();
    assert_eq!(decoded.match_duration, 0);
    assert_eq!(decoded.match_id, entry.match_id);
}

#[test]
fn test_decode_rejects_future_version() {
    let mut entry = test_entry();
    entry.version = MATCH_DATA_ENTRY_VERSION + 1;
    let data = entry.encode().unwrap();
    assert!(matches!(
        MatchDataEntry::decode(&data).unwrap_err(),
        CodecError::UnknownVersion { .. }
    ));
}

// =============================================================================
// Bounds
// =============================================================================

#[test]
fn test_decode_rejects_count_over_capacity() {
    let entry = MatchDataEntry {
        session_id: 1,
        buyer_id: 1,
        match_id: 1,
        ..Default::default()
    };
    let mut data = entry.encode().unwrap();

    // num_match_values sits after the fixed scalars and the empty
    // server_address: version + timestamp + buyer + (len) + datacenter +
    // user_hash + session + match = 4+4+8+4+8+8+8+8
    let count_offset = 52;
    data[count_offset..count_offset + 4]
        .copy_from_slice(&((MAX_MATCH_VALUES as u32 + 1).to_le_bytes()));

    let err = MatchDataEntry::decode(&data).unwrap_err();
    assert!(
        matches!(err, CodecError::CountOutOfRange { field, .. } if field == "num_match_values")
    );
}

#[test]
fn test_decode_rejects_over_length_string() {
    let entry = MatchDataEntry {
        session_id: 1,
        buyer_id: 1,
        match_id: 1,
        ..Default::default()
    };
    let mut data = entry.encode().unwrap();

    // server_address length prefix sits after version + timestamp + buyer
    let len_offset = 16;
    data[len_offset..len_offset + 4]
        .copy_from_slice(&((MAX_SERVER_ADDRESS_LENGTH as u32 + 1).to_le_bytes()));

    let err = MatchDataEntry::decode(&data).unwrap_err();
    assert!(
        matches!(err, CodecError::StringTooLong { field, .. } if field == "server_address")
    );
}

#[test]
fn test_encode_rejects_over_length_address() {
    let mut entry = test_entry();
    entry.server_address = "a".repeat(MAX_SERVER_ADDRESS_LENGTH + 1);
    assert!(matches!(
        entry.encode().unwrap_err(),
        CodecError::StringTooLong { .. }
    ));
}

#[test]
fn test_clamp_then_encode() {
    let mut entry = test_entry();
    entry.num_match_values = 500;
    entry.server_address = "b".repeat(4096);
    entry.clamp();
    let data = entry.encode().unwrap();
    let decoded = MatchDataEntry::decode(&data).unwrap();
    assert_eq!(decoded.num_match_values, MAX_MATCH_VALUES as i32);
    assert_eq!(decoded.server_address.len(), MAX_SERVER_ADDRESS_LENGTH);
}

// =============================================================================
// Validate + sanitize
// =============================================================================

#[test]
fn test_validate_rejects_zero_identifiers() {
    let mut entry = test_entry();
    entry.match_id = 0;
    assert_eq!(entry.validate(), Err("match_id"));

    let mut entry = test_entry();
    entry.buyer_id = 0;
    assert_eq!(entry.validate(), Err("buyer_id"));
}

#[test]
fn test_sanitize_zeroes_nan_match_values() {
    let mut entry = test_entry();
    entry.match_values[2] = f64::NAN;
    entry.match_values[4] = f64::INFINITY;

    let hit = entry.sanitize_floats();

    assert_eq!(hit.len(), 2);
    assert_eq!(entry.match_values[2], 0.0);
    assert_eq!(entry.match_values[4], 0.0);
}

#[test]
fn test_sanitize_ignores_values_beyond_count() {
    let mut entry = test_entry();
    entry.match_values[MAX_MATCH_VALUES - 1] = f64::NAN;
    assert!(entry.sanitize_floats().is_empty());
}

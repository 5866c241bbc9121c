//! Tests for BeaconEntry codec

use crate::beacon::{BEACON_ENTRY_VERSION, BeaconEntry, MAX_SDK_VERSION_LENGTH};
use crate::record::{Record, Storable};
use crate::CodecError;

fn test_entry() -> BeaconEntry {
    BeaconEntry {
        version: BEACON_ENTRY_VERSION,
        timestamp: 1_700_000_456,
        session_id: 0xbeac_0001,
        user_hash: 0x9999,
        buyer_id: 7,
        platform_type: 3,
        connection_type: 2,
        enabled: true,
        upgraded: true,
        next: false,
        fallback_to_direct: false,
        sdk_version: "4.20.1".to_string(),
    }
}

#[test]
fn test_roundtrip() {
    let entry = test_entry();
    let data = entry.encode().unwrap();
    assert_eq!(entry, BeaconEntry::decode(&data).unwrap());
}

#[test]
fn test_v0_payload_has_no_sdk_version() {
    let mut entry = test_entry();
    entry.version = 0;
    let data = entry.encode().unwrap();
    let decoded = BeaconEntry::decode(&data).unwrap();
    assert_eq!(decoded.sdk_version, "");
    assert!(decoded.upgraded);
}

#[test]
fn test_decode_rejects_future_version() {
    let mut entry = test_entry();
    entry.version = BEACON_ENTRY_VERSION + 1;
    let data = entry.encode().unwrap();
    assert!(matches!(
        BeaconEntry::decode(&data).unwrap_err(),
        CodecError::UnknownVersion { .. }
    ));
}

#[test]
fn test_encode_rejects_bad_platform_type() {
    let mut entry = test_entry();
    entry.platform_type = 11;
    assert!(matches!(
        entry.encode().unwrap_err(),
        CodecError::ValueOutOfRange { field } if field == "platform_type"
    ));
}

#[test]
fn test_clamp_resets_unknown_enum_values() {
    let mut entry = test_entry();
    entry.platform_type = 99;
    entry.connection_type = -1;
    entry.sdk_version = "1.2.3-prerelease-very-long".to_string();
    entry.clamp();
    assert_eq!(entry.platform_type, 0);
    assert_eq!(entry.connection_type, 0);
    assert!(entry.sdk_version.len() <= MAX_SDK_VERSION_LENGTH);
    entry.encode().unwrap();
}

#[test]
fn test_validate_rejects_zero_session() {
    let mut entry = test_entry();
    entry.session_id = 0;
    assert_eq!(entry.validate(), Err("session_id"));
}

#[test]
fn test_truncated_payload() {
    let entry = test_entry();
    let data = entry.encode().unwrap();
    assert!(matches!(
        BeaconEntry::decode(&data[..10]).unwrap_err(),
        CodecError::MessageTooShort { .. }
    ));
}

//! Backhaul Protocol - versioned telemetry records and batch framing
//!
//! This crate provides the record types that flow through the pipeline:
//! - `BillingEntry`, `MatchDataEntry`, `BeaconEntry`, `RelayUpdateRequest`
//! - `Record` - the codec contract every entry kind implements
//! - `Storable` - sink-side validation and float sanitization
//! - `FrameBuilder` / `split_frames` - length-prefixed batch framing
//!
//! # Wire Format
//!
//! Every record serializes its `version` field first, then a fixed,
//! never-reordered field sequence. Fields added in schema version `N` are
//! written and read only when `version >= N`, so payloads written by an
//! older producer remain readable forever, and a newer reader leaves the
//! missing fields at their zero values.
//!
//! A batched bus message is the concatenation of framed records:
//!
//! ```text
//! [u32 length][length bytes][u32 length][length bytes]...
//! ```
//!
//! All integers are little-endian. Strings are a u32 length followed by
//! UTF-8 bytes, bounded arrays are a u32 count followed by `count`
//! elements; both are checked against their declared maxima on decode.

mod beacon;
mod billing;
mod error;
mod frame;
mod match_data;
mod record;
mod relay_update;
mod wire;

pub use beacon::{BEACON_ENTRY_VERSION, BeaconEntry, MAX_BEACON_ENTRY_BYTES, MAX_SDK_VERSION_LENGTH};
pub use billing::{
    BILLING_ENTRY_VERSION, BillingEntry, MAX_ADDRESS_LENGTH, MAX_BILLING_ENTRY_BYTES,
    MAX_ISP_LENGTH, MAX_NEAR_RELAYS, MAX_NEXT_RELAYS, MAX_TAGS,
};
pub use error::CodecError;
pub use frame::{FrameBuilder, FrameIter, iter_frames, split_frames};
pub use match_data::{
    MATCH_DATA_ENTRY_VERSION, MAX_MATCH_DATA_ENTRY_BYTES, MAX_MATCH_VALUES,
    MAX_SERVER_ADDRESS_LENGTH, MatchDataEntry,
};
pub use record::{Record, Storable};
pub use relay_update::{
    MAX_RELAY_PINGS, MAX_RELAY_UPDATE_REQUEST_BYTES, MAX_RELAY_VERSION_LENGTH,
    RELAY_UPDATE_REQUEST_VERSION, RelayUpdateRequest,
};

// Re-export bytes for convenience
pub use bytes::Bytes;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, CodecError>;

// Test modules - only compiled during testing
#[cfg(test)]
#[path = "beacon_test.rs"]
mod beacon_test;
#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;
#[cfg(test)]
#[path = "match_data_test.rs"]
mod match_data_test;

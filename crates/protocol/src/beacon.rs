//! Beacon entry - lightweight SDK liveness signal
//!
//! Beacons arrive at high volume from every SDK instance, whether or not
//! the session was ever accelerated, so the record is deliberately small.
//!
//! # Versions
//!
//! - v2: reported SDK version string

use crate::record::{clamp_string, Record, Storable};
use crate::wire::{Reader, Writer};
use crate::CodecError;

/// Current beacon entry schema version
pub const BEACON_ENTRY_VERSION: u32 = 2;

/// Maximum SDK version string length in bytes ("255.255.255")
pub const MAX_SDK_VERSION_LENGTH: usize = 11;

/// Worst case serialized size
pub const MAX_BEACON_ENTRY_BYTES: usize = 4 // version
    + 4                                      // timestamp
    + 8 + 8 + 8                              // session, user hash, buyer
    + 4 + 4                                  // platform_type, connection_type
    + 4                                      // flags
    + 4 + MAX_SDK_VERSION_LENGTH; // sdk_version (v2)

/// One beacon record per SDK report
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconEntry {
    pub version: u32,
    pub timestamp: u32,
    pub session_id: u64,
    pub user_hash: u64,
    pub buyer_id: u64,
    pub platform_type: i32,
    pub connection_type: i32,
    pub enabled: bool,
    pub upgraded: bool,
    pub next: bool,
    pub fallback_to_direct: bool,

    // v2
    pub sdk_version: String,
}

impl Default for BeaconEntry {
    fn default() -> Self {
        Self {
            version: BEACON_ENTRY_VERSION,
            timestamp: 0,
            session_id: 0,
            user_hash: 0,
            buyer_id: 0,
            platform_type: 0,
            connection_type: 0,
            enabled: false,
            upgraded: false,
            next: false,
            fallback_to_direct: false,
            sdk_version: String::new(),
        }
    }
}

impl BeaconEntry {
    /// Normalize out-of-range fields so a subsequent `encode` cannot fail
    pub fn clamp(&mut self) {
        if self.platform_type < 0 || self.platform_type > 10 {
            self.platform_type = 0;
        }
        if self.connection_type < 0 || self.connection_type > 3 {
            self.connection_type = 0;
        }
        clamp_string(&mut self.sdk_version, MAX_SDK_VERSION_LENGTH);
    }
}

impl Record for BeaconEntry {
    const KIND: &'static str = "beacon";
    const CURRENT_VERSION: u32 = BEACON_ENTRY_VERSION;
    const MAX_BYTES: usize = MAX_BEACON_ENTRY_BYTES;

    #[inline]
    fn shard_key(&self) -> u64 {
        self.session_id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.platform_type < 0 || self.platform_type > 10 {
            return Err(CodecError::ValueOutOfRange {
                field: "platform_type",
            });
        }
        if self.connection_type < 0 || self.connection_type > 3 {
            return Err(CodecError::ValueOutOfRange {
                field: "connection_type",
            });
        }

        let mut w = Writer::with_capacity(MAX_BEACON_ENTRY_BYTES);

        w.u32(self.version);
        w.u32(self.timestamp);
        w.u64(self.session_id);
        w.u64(self.user_hash);
        w.u64(self.buyer_id);
        w.i32(self.platform_type);
        w.i32(self.connection_type);
        w.bool(self.enabled);
        w.bool(self.upgraded);
        w.bool(self.next);
        w.bool(self.fallback_to_direct);

        if self.version >= 2 {
            w.string("sdk_version", &self.sdk_version, MAX_SDK_VERSION_LENGTH)?;
        }

        Ok(w.finish())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data);
        let mut entry = Self::default();

        entry.version = r.u32()?;
        if entry.version > BEACON_ENTRY_VERSION {
            return Err(CodecError::unknown_version(
                entry.version,
                BEACON_ENTRY_VERSION,
            ));
        }

        entry.timestamp = r.u32()?;
        entry.session_id = r.u64()?;
        entry.user_hash = r.u64()?;
        entry.buyer_id = r.u64()?;
        entry.platform_type = r.i32()?;
        entry.connection_type = r.i32()?;
        entry.enabled = r.bool()?;
        entry.upgraded = r.bool()?;
        entry.next = r.bool()?;
        entry.fallback_to_direct = r.bool()?;

        if entry.version >= 2 {
            entry.sdk_version = r.string("sdk_version", MAX_SDK_VERSION_LENGTH)?;
        }

        Ok(entry)
    }
}

impl Storable for BeaconEntry {
    fn validate(&self) -> Result<(), &'static str> {
        if self.session_id == 0 {
            return Err("session_id");
        }
        if self.buyer_id == 0 {
            return Err("buyer_id");
        }
        if self.platform_type < 0 || self.platform_type > 10 {
            return Err("platform_type");
        }
        if self.connection_type < 0 || self.connection_type > 3 {
            return Err("connection_type");
        }
        Ok(())
    }

    fn sanitize_floats(&mut self) -> Vec<&'static str> {
        // No float fields
        Vec::new()
    }
}

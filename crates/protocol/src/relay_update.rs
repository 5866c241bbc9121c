//! Relay update request - periodic relay status report
//!
//! Relays post one of these per update interval. The gateway accumulates
//! the raw encoded payloads and fans them out to every backend replica;
//! the backends decode them to refresh relay liveness and ping state.
//!
//! # Versions
//!
//! - v1: `shutting_down` flag for graceful relay drain

use crate::record::{clamp_i32, clamp_string, Record, Storable};
use crate::wire::{Reader, Writer};
use crate::CodecError;

/// Current relay update request schema version
pub const RELAY_UPDATE_REQUEST_VERSION: u32 = 1;

/// Maximum relay-to-relay ping samples per update
pub const MAX_RELAY_PINGS: usize = 32;

/// Maximum relay software version string length in bytes
pub const MAX_RELAY_VERSION_LENGTH: usize = 32;

/// Worst case serialized size
pub const MAX_RELAY_UPDATE_REQUEST_BYTES: usize = 4 // version
    + 4                                              // timestamp
    + 8                                              // relay_id
    + 4                                              // session_count
    + 4 + MAX_RELAY_VERSION_LENGTH
    + 4 + MAX_RELAY_PINGS * (8 + 4)
    + 1; // shutting_down (v1)

/// One status report per relay per update interval
#[derive(Debug, Clone, PartialEq)]
pub struct RelayUpdateRequest {
    pub version: u32,
    pub timestamp: u32,
    pub relay_id: u64,
    pub session_count: u32,
    pub relay_version: String,
    pub num_relay_pings: i32,
    pub ping_relay_ids: [u64; MAX_RELAY_PINGS],
    pub ping_rtts: [i32; MAX_RELAY_PINGS],

    // v1
    pub shutting_down: bool,
}

impl Default for RelayUpdateRequest {
    fn default() -> Self {
        Self {
            version: RELAY_UPDATE_REQUEST_VERSION,
            timestamp: 0,
            relay_id: 0,
            session_count: 0,
            relay_version: String::new(),
            num_relay_pings: 0,
            ping_relay_ids: [0; MAX_RELAY_PINGS],
            ping_rtts: [0; MAX_RELAY_PINGS],
            shutting_down: false,
        }
    }
}

impl RelayUpdateRequest {
    /// Normalize out-of-range fields so a subsequent `encode` cannot fail
    pub fn clamp(&mut self) {
        clamp_string(&mut self.relay_version, MAX_RELAY_VERSION_LENGTH);
        clamp_i32(&mut self.num_relay_pings, 0, MAX_RELAY_PINGS as i32);
        for i in 0..self.num_relay_pings as usize {
            clamp_i32(&mut self.ping_rtts[i], 0, 255);
        }
    }
}

impl Record for RelayUpdateRequest {
    const KIND: &'static str = "relay_update";
    const CURRENT_VERSION: u32 = RELAY_UPDATE_REQUEST_VERSION;
    const MAX_BYTES: usize = MAX_RELAY_UPDATE_REQUEST_BYTES;

    #[inline]
    fn shard_key(&self) -> u64 {
        self.relay_id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = Writer::with_capacity(MAX_RELAY_UPDATE_REQUEST_BYTES);

        w.u32(self.version);
        w.u32(self.timestamp);
        w.u64(self.relay_id);
        w.u32(self.session_count);
        w.string("relay_version", &self.relay_version, MAX_RELAY_VERSION_LENGTH)?;
        let num = w.count("num_relay_pings", self.num_relay_pings, MAX_RELAY_PINGS)?;
        for i in 0..num {
            if self.ping_rtts[i] < 0 || self.ping_rtts[i] > 255 {
                return Err(CodecError::ValueOutOfRange { field: "ping_rtts" });
            }
            w.u64(self.ping_relay_ids[i]);
            w.i32(self.ping_rtts[i]);
        }

        if self.version >= 1 {
            w.bool(self.shutting_down);
        }

        Ok(w.finish())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data);
        let mut entry = Self::default();

        entry.version = r.u32()?;
        if entry.version > RELAY_UPDATE_REQUEST_VERSION {
            return Err(CodecError::unknown_version(
                entry.version,
                RELAY_UPDATE_REQUEST_VERSION,
            ));
        }

        entry.timestamp = r.u32()?;
        entry.relay_id = r.u64()?;
        entry.session_count = r.u32()?;
        entry.relay_version = r.string("relay_version", MAX_RELAY_VERSION_LENGTH)?;
        let num = r.count("num_relay_pings", MAX_RELAY_PINGS)?;
        entry.num_relay_pings = num as i32;
        for i in 0..num {
            entry.ping_relay_ids[i] = r.u64()?;
            entry.ping_rtts[i] = r.i32()?;
        }

        if entry.version >= 1 {
            entry.shutting_down = r.bool()?;
        }

        Ok(entry)
    }
}

impl Storable for RelayUpdateRequest {
    fn validate(&self) -> Result<(), &'static str> {
        if self.relay_id == 0 {
            return Err("relay_id");
        }
        if self.num_relay_pings < 0 || self.num_relay_pings > MAX_RELAY_PINGS as i32 {
            return Err("num_relay_pings");
        }
        Ok(())
    }

    fn sanitize_floats(&mut self) -> Vec<&'static str> {
        // No float fields
        Vec::new()
    }
}

//! Match data entry - per-match gameplay statistics
//!
//! Produced once per match by the server SDK, carrying an opaque list of
//! game-defined match values.
//!
//! # Versions
//!
//! - v2: `match_duration` in seconds

use crate::record::{clamp_i32, clamp_string, sanitize_f64, Record, Storable};
use crate::wire::{Reader, Writer};
use crate::CodecError;

/// Current match data entry schema version
pub const MATCH_DATA_ENTRY_VERSION: u32 = 2;

/// Maximum game-defined match values per entry
pub const MAX_MATCH_VALUES: usize = 64;

/// Maximum server address length in bytes
pub const MAX_SERVER_ADDRESS_LENGTH: usize = 256;

/// Worst case serialized size
pub const MAX_MATCH_DATA_ENTRY_BYTES: usize = 4 // version
    + 4                                          // timestamp
    + 8 + 8 + 8 + 8                              // buyer, datacenter, user hash, session
    + 4 + MAX_SERVER_ADDRESS_LENGTH
    + 8                                          // match_id
    + 4 + MAX_MATCH_VALUES * 8
    + 4; // match_duration (v2)

/// One match data record per completed match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDataEntry {
    pub version: u32,
    pub timestamp: u32,
    pub buyer_id: u64,
    pub server_address: String,
    pub datacenter_id: u64,
    pub user_hash: u64,
    pub session_id: u64,
    pub match_id: u64,
    pub num_match_values: i32,
    pub match_values: [f64; MAX_MATCH_VALUES],

    // v2
    pub match_duration: u32,
}

impl Default for MatchDataEntry {
    fn default() -> Self {
        Self {
            version: MATCH_DATA_ENTRY_VERSION,
            timestamp: 0,
            buyer_id: 0,
            server_address: String::new(),
            datacenter_id: 0,
            user_hash: 0,
            session_id: 0,
            match_id: 0,
            num_match_values: 0,
            match_values: [0.0; MAX_MATCH_VALUES],
            match_duration: 0,
        }
    }
}

impl MatchDataEntry {
    /// Normalize out-of-range fields so a subsequent `encode` cannot fail
    pub fn clamp(&mut self) {
        clamp_string(&mut self.server_address, MAX_SERVER_ADDRESS_LENGTH);
        clamp_i32(&mut self.num_match_values, 0, MAX_MATCH_VALUES as i32);
    }
}

impl Record for MatchDataEntry {
    const KIND: &'static str = "match_data";
    const CURRENT_VERSION: u32 = MATCH_DATA_ENTRY_VERSION;
    const MAX_BYTES: usize = MAX_MATCH_DATA_ENTRY_BYTES;

    #[inline]
    fn shard_key(&self) -> u64 {
        self.session_id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut w = Writer::with_capacity(MAX_MATCH_DATA_ENTRY_BYTES);

        w.u32(self.version);
        w.u32(self.timestamp);
        w.u64(self.buyer_id);
        w.string("server_address", &self.server_address, MAX_SERVER_ADDRESS_LENGTH)?;
        w.u64(self.datacenter_id);
        w.u64(self.user_hash);
        w.u64(self.session_id);
        w.u64(self.match_id);
        let num = w.count("num_match_values", self.num_match_values, MAX_MATCH_VALUES)?;
        for i in 0..num {
            w.f64(self.match_values[i]);
        }

        if self.version >= 2 {
            w.u32(self.match_duration);
        }

        Ok(w.finish())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data);
        let mut entry = Self::default();

        entry.version = r.u32()?;
        if entry.version > MATCH_DATA_ENTRY_VERSION {
            return Err(CodecError::unknown_version(
                entry.version,
                MATCH_DATA_ENTRY_VERSION,
            ));
        }

        entry.timestamp = r.u32()?;
        entry.buyer_id = r.u64()?;
        entry.server_address = r.string("server_address", MAX_SERVER_ADDRESS_LENGTH)?;
        entry.datacenter_id = r.u64()?;
        entry.user_hash = r.u64()?;
        entry.session_id = r.u64()?;
        entry.match_id = r.u64()?;
        let num = r.count("num_match_values", MAX_MATCH_VALUES)?;
        entry.num_match_values = num as i32;
        for i in 0..num {
            entry.match_values[i] = r.f64()?;
        }

        if entry.version >= 2 {
            entry.match_duration = r.u32()?;
        }

        Ok(entry)
    }
}

impl Storable for MatchDataEntry {
    fn validate(&self) -> Result<(), &'static str> {
        if self.session_id == 0 {
            return Err("session_id");
        }
        if self.buyer_id == 0 {
            return Err("buyer_id");
        }
        if self.match_id == 0 {
            return Err("match_id");
        }
        if self.num_match_values < 0 || self.num_match_values > MAX_MATCH_VALUES as i32 {
            return Err("num_match_values");
        }
        Ok(())
    }

    fn sanitize_floats(&mut self) -> Vec<&'static str> {
        let mut hit = Vec::new();
        for i in 0..self.num_match_values.clamp(0, MAX_MATCH_VALUES as i32) as usize {
            sanitize_f64(&mut self.match_values[i], "match_values", &mut hit);
        }
        hit
    }
}

//! Billing entry - one per session slice
//!
//! The richest record in the pipeline. A session produces one entry per
//! measurement slice; slice 0 and the summary slice carry the session
//! identity block, the summary slice carries end-of-session aggregates,
//! and slices on the accelerated path carry the next-route block.
//!
//! # Versions
//!
//! - v1: next bytes up/down for slices on the accelerated path
//! - v2: `ever_on_next` and `session_duration` in the summary slice
//! - v3: near relay samples in the summary slice
//! - v4: `user_flags` (always) and `client_address` (identity block)

use crate::record::{
    clamp_f32, clamp_i32, clamp_string, sanitize_f32, Record, Storable,
};
use crate::wire::{Reader, Writer};
use crate::CodecError;

/// Current billing entry schema version
pub const BILLING_ENTRY_VERSION: u32 = 4;

/// Maximum relays on an accelerated route
pub const MAX_NEXT_RELAYS: usize = 5;

/// Maximum near relay samples in a summary slice
pub const MAX_NEAR_RELAYS: usize = 32;

/// Maximum session tags
pub const MAX_TAGS: usize = 8;

/// Maximum ISP name length in bytes
pub const MAX_ISP_LENGTH: usize = 64;

/// Maximum client address length in bytes
pub const MAX_ADDRESS_LENGTH: usize = 256;

/// Worst case serialized size: every array at capacity, every string at
/// maximum length
pub const MAX_BILLING_ENTRY_BYTES: usize = 4  // version
    + 4 + 8 + 4                               // timestamp, session_id, slice_number
    + 5 * 4                                   // direct/real stats
    + 3                                       // next, flagged, summary
    + 4                                       // route_diversity
    + 8                                       // user_flags (v4)
    + 8 + 8 + 8 + 4 + 4                       // identity block scalars
    + 4 + MAX_ISP_LENGTH
    + 4 + 4                                   // connection_type, platform_type
    + 4 + MAX_TAGS * 8
    + 4 + MAX_ADDRESS_LENGTH                  // client_address (v4)
    + 1 + 4                                   // ever_on_next, session_duration (v2)
    + 4 + MAX_NEAR_RELAYS * (8 + 4 + 4 + 4)   // near relay samples (v3)
    + 4 * 4                                   // next stats
    + 4 + MAX_NEXT_RELAYS * (8 + 8)
    + 8                                       // total_price
    + 8 + 8; // next bytes up/down (v1)

/// One billing record per session slice
#[derive(Debug, Clone, PartialEq)]
pub struct BillingEntry {
    // always
    pub version: u32,
    pub timestamp: u32,
    pub session_id: u64,
    pub slice_number: u32,
    pub direct_rtt: f32,
    pub direct_jitter: f32,
    pub direct_packet_loss: f32,
    pub real_packet_loss: f32,
    pub real_jitter: f32,
    pub next: bool,
    pub flagged: bool,
    pub summary: bool,
    pub route_diversity: i32,
    pub user_flags: u64,

    // first slice and summary slice only
    pub datacenter_id: u64,
    pub buyer_id: u64,
    pub user_hash: u64,
    pub latitude: f32,
    pub longitude: f32,
    pub isp: String,
    pub connection_type: i32,
    pub platform_type: i32,
    pub num_tags: i32,
    pub tags: [u64; MAX_TAGS],
    pub client_address: String,

    // summary slice only
    pub ever_on_next: bool,
    pub session_duration: u32,
    pub num_near_relays: i32,
    pub near_relay_ids: [u64; MAX_NEAR_RELAYS],
    pub near_relay_rtts: [f32; MAX_NEAR_RELAYS],
    pub near_relay_jitters: [f32; MAX_NEAR_RELAYS],
    pub near_relay_packet_losses: [f32; MAX_NEAR_RELAYS],

    // accelerated path only
    pub next_rtt: f32,
    pub next_jitter: f32,
    pub next_packet_loss: f32,
    pub predicted_next_rtt: f32,
    pub num_next_relays: i32,
    pub next_relays: [u64; MAX_NEXT_RELAYS],
    pub next_relay_prices: [u64; MAX_NEXT_RELAYS],
    pub total_price: u64,
    pub next_bytes_up: u64,
    pub next_bytes_down: u64,
}

impl Default for BillingEntry {
    fn default() -> Self {
        Self {
            version: BILLING_ENTRY_VERSION,
            timestamp: 0,
            session_id: 0,
            slice_number: 0,
            direct_rtt: 0.0,
            direct_jitter: 0.0,
            direct_packet_loss: 0.0,
            real_packet_loss: 0.0,
            real_jitter: 0.0,
            next: false,
            flagged: false,
            summary: false,
            route_diversity: 0,
            user_flags: 0,
            datacenter_id: 0,
            buyer_id: 0,
            user_hash: 0,
            latitude: 0.0,
            longitude: 0.0,
            isp: String::new(),
            connection_type: 0,
            platform_type: 0,
            num_tags: 0,
            tags: [0; MAX_TAGS],
            client_address: String::new(),
            ever_on_next: false,
            session_duration: 0,
            num_near_relays: 0,
            near_relay_ids: [0; MAX_NEAR_RELAYS],
            near_relay_rtts: [0.0; MAX_NEAR_RELAYS],
            near_relay_jitters: [0.0; MAX_NEAR_RELAYS],
            near_relay_packet_losses: [0.0; MAX_NEAR_RELAYS],
            next_rtt: 0.0,
            next_jitter: 0.0,
            next_packet_loss: 0.0,
            predicted_next_rtt: 0.0,
            num_next_relays: 0,
            next_relays: [0; MAX_NEXT_RELAYS],
            next_relay_prices: [0; MAX_NEXT_RELAYS],
            total_price: 0,
            next_bytes_up: 0,
            next_bytes_down: 0,
        }
    }
}

impl BillingEntry {
    /// Check whether this slice carries the session identity block
    #[inline]
    fn has_identity_block(&self) -> bool {
        self.slice_number == 0 || self.summary
    }

    /// Normalize out-of-range fields so a subsequent `encode` cannot
    /// fail. Lossy but safe; run by the producer before submission.
    pub fn clamp(&mut self) {
        clamp_f32(&mut self.direct_rtt, 0.0, 10_000.0);
        clamp_f32(&mut self.direct_jitter, 0.0, 10_000.0);
        clamp_f32(&mut self.direct_packet_loss, 0.0, 100.0);
        clamp_f32(&mut self.real_packet_loss, 0.0, 100.0);
        clamp_f32(&mut self.real_jitter, 0.0, 1_000.0);
        clamp_i32(&mut self.route_diversity, 0, 32);

        clamp_string(&mut self.isp, MAX_ISP_LENGTH);
        clamp_string(&mut self.client_address, MAX_ADDRESS_LENGTH);
        if self.connection_type < 0 || self.connection_type > 3 {
            self.connection_type = 0;
        }
        if self.platform_type < 0 || self.platform_type > 10 {
            self.platform_type = 0;
        }
        clamp_i32(&mut self.num_tags, 0, MAX_TAGS as i32);

        clamp_i32(&mut self.num_near_relays, 0, MAX_NEAR_RELAYS as i32);
        for i in 0..self.num_near_relays as usize {
            clamp_f32(&mut self.near_relay_rtts[i], 0.0, 255.0);
            clamp_f32(&mut self.near_relay_jitters[i], 0.0, 255.0);
            clamp_f32(&mut self.near_relay_packet_losses[i], 0.0, 100.0);
        }

        clamp_f32(&mut self.next_rtt, 0.0, 10_000.0);
        clamp_f32(&mut self.next_jitter, 0.0, 10_000.0);
        clamp_f32(&mut self.next_packet_loss, 0.0, 100.0);
        clamp_f32(&mut self.predicted_next_rtt, 0.0, 10_000.0);
        clamp_i32(&mut self.num_next_relays, 0, MAX_NEXT_RELAYS as i32);
    }
}

impl Record for BillingEntry {
    const KIND: &'static str = "billing";
    const CURRENT_VERSION: u32 = BILLING_ENTRY_VERSION;
    const MAX_BYTES: usize = MAX_BILLING_ENTRY_BYTES;

    #[inline]
    fn shard_key(&self) -> u64 {
        self.session_id
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.route_diversity < 0 || self.route_diversity > 32 {
            return Err(CodecError::ValueOutOfRange {
                field: "route_diversity",
            });
        }

        let mut w = Writer::with_capacity(MAX_BILLING_ENTRY_BYTES);

        w.u32(self.version);
        w.u32(self.timestamp);
        w.u64(self.session_id);
        w.u32(self.slice_number);
        w.f32(self.direct_rtt);
        w.f32(self.direct_jitter);
        w.f32(self.direct_packet_loss);
        w.f32(self.real_packet_loss);
        w.f32(self.real_jitter);
        w.bool(self.next);
        w.bool(self.flagged);
        w.bool(self.summary);
        w.i32(self.route_diversity);

        if self.version >= 4 {
            w.u64(self.user_flags);
        }

        if self.has_identity_block() {
            if self.connection_type < 0 || self.connection_type > 3 {
                return Err(CodecError::ValueOutOfRange {
                    field: "connection_type",
                });
            }
            if self.platform_type < 0 || self.platform_type > 10 {
                return Err(CodecError::ValueOutOfRange {
                    field: "platform_type",
                });
            }

            w.u64(self.datacenter_id);
            w.u64(self.buyer_id);
            w.u64(self.user_hash);
            w.f32(self.latitude);
            w.f32(self.longitude);
            w.string("isp", &self.isp, MAX_ISP_LENGTH)?;
            w.i32(self.connection_type);
            w.i32(self.platform_type);
            let num_tags = w.count("num_tags", self.num_tags, MAX_TAGS)?;
            for i in 0..num_tags {
                w.u64(self.tags[i]);
            }
            if self.version >= 4 {
                w.string("client_address", &self.client_address, MAX_ADDRESS_LENGTH)?;
            }
        }

        if self.summary {
            if self.version >= 2 {
                w.bool(self.ever_on_next);
                w.u32(self.session_duration);
            }
            if self.version >= 3 {
                let num = w.count("num_near_relays", self.num_near_relays, MAX_NEAR_RELAYS)?;
                for i in 0..num {
                    w.u64(self.near_relay_ids[i]);
                    w.f32(self.near_relay_rtts[i]);
                    w.f32(self.near_relay_jitters[i]);
                    w.f32(self.near_relay_packet_losses[i]);
                }
            }
        }

        if self.next {
            w.f32(self.next_rtt);
            w.f32(self.next_jitter);
            w.f32(self.next_packet_loss);
            w.f32(self.predicted_next_rtt);
            let num = w.count("num_next_relays", self.num_next_relays, MAX_NEXT_RELAYS)?;
            for i in 0..num {
                w.u64(self.next_relays[i]);
                w.u64(self.next_relay_prices[i]);
            }
            w.u64(self.total_price);
            if self.version >= 1 {
                w.u64(self.next_bytes_up);
                w.u64(self.next_bytes_down);
            }
        }

        Ok(w.finish())
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(data);
        let mut entry = Self::default();

        entry.version = r.u32()?;
        if entry.version > BILLING_ENTRY_VERSION {
            return Err(CodecError::unknown_version(
                entry.version,
                BILLING_ENTRY_VERSION,
            ));
        }

        entry.timestamp = r.u32()?;
        entry.session_id = r.u64()?;
        entry.slice_number = r.u32()?;
        entry.direct_rtt = r.f32()?;
        entry.direct_jitter = r.f32()?;
        entry.direct_packet_loss = r.f32()?;
        entry.real_packet_loss = r.f32()?;
        entry.real_jitter = r.f32()?;
        entry.next = r.bool()?;
        entry.flagged = r.bool()?;
        entry.summary = r.bool()?;
        entry.route_diversity = r.i32()?;

        if entry.version >= 4 {
            entry.user_flags = r.u64()?;
        }

        if entry.has_identity_block() {
            entry.datacenter_id = r.u64()?;
            entry.buyer_id = r.u64()?;
            entry.user_hash = r.u64()?;
            entry.latitude = r.f32()?;
            entry.longitude = r.f32()?;
            entry.isp = r.string("isp", MAX_ISP_LENGTH)?;
            entry.connection_type = r.i32()?;
            entry.platform_type = r.i32()?;
            let num_tags = r.count("num_tags", MAX_TAGS)?;
            entry.num_tags = num_tags as i32;
            for i in 0..num_tags {
                entry.tags[i] = r.u64()?;
            }
            if entry.version >= 4 {
                entry.client_address = r.string("client_address", MAX_ADDRESS_LENGTH)?;
            }
        }

        if entry.summary {
            if entry.version >= 2 {
                entry.ever_on_next = r.bool()?;
                entry.session_duration = r.u32()?;
            }
            if entry.version >= 3 {
                let num = r.count("num_near_relays", MAX_NEAR_RELAYS)?;
                entry.num_near_relays = num as i32;
                for i in 0..num {
                    entry.near_relay_ids[i] = r.u64()?;
                    entry.near_relay_rtts[i] = r.f32()?;
                    entry.near_relay_jitters[i] = r.f32()?;
                    entry.near_relay_packet_losses[i] = r.f32()?;
                }
            }
        }

        if entry.next {
            entry.next_rtt = r.f32()?;
            entry.next_jitter = r.f32()?;
            entry.next_packet_loss = r.f32()?;
            entry.predicted_next_rtt = r.f32()?;
            let num = r.count("num_next_relays", MAX_NEXT_RELAYS)?;
            entry.num_next_relays = num as i32;
            for i in 0..num {
                entry.next_relays[i] = r.u64()?;
                entry.next_relay_prices[i] = r.u64()?;
            }
            entry.total_price = r.u64()?;
            if entry.version >= 1 {
                entry.next_bytes_up = r.u64()?;
                entry.next_bytes_down = r.u64()?;
            }
        }

        Ok(entry)
    }
}

impl Storable for BillingEntry {
    fn validate(&self) -> Result<(), &'static str> {
        if self.session_id == 0 {
            return Err("session_id");
        }
        if !(self.direct_packet_loss >= 0.0 && self.direct_packet_loss <= 100.0) {
            return Err("direct_packet_loss");
        }
        if self.route_diversity < 0 || self.route_diversity > 32 {
            return Err("route_diversity");
        }

        if self.has_identity_block() {
            if self.buyer_id == 0 {
                return Err("buyer_id");
            }
            // Inverted comparisons: a NaN compares false against everything
            if !(self.latitude >= -90.0 && self.latitude <= 90.0) {
                return Err("latitude");
            }
            if !(self.longitude >= -180.0 && self.longitude <= 180.0) {
                return Err("longitude");
            }
            if self.connection_type < 0 || self.connection_type > 3 {
                return Err("connection_type");
            }
            if self.platform_type < 0 || self.platform_type > 10 {
                return Err("platform_type");
            }
            if self.num_tags < 0 || self.num_tags > MAX_TAGS as i32 {
                return Err("num_tags");
            }
        }

        if self.summary && (self.num_near_relays < 0 || self.num_near_relays > MAX_NEAR_RELAYS as i32)
        {
            return Err("num_near_relays");
        }

        if self.next {
            if !(self.next_packet_loss >= 0.0 && self.next_packet_loss <= 100.0) {
                return Err("next_packet_loss");
            }
            if self.num_next_relays < 0 || self.num_next_relays > MAX_NEXT_RELAYS as i32 {
                return Err("num_next_relays");
            }
        }

        Ok(())
    }

    fn sanitize_floats(&mut self) -> Vec<&'static str> {
        let mut hit = Vec::new();
        sanitize_f32(&mut self.direct_rtt, "direct_rtt", &mut hit);
        sanitize_f32(&mut self.direct_jitter, "direct_jitter", &mut hit);
        sanitize_f32(&mut self.direct_packet_loss, "direct_packet_loss", &mut hit);
        sanitize_f32(&mut self.real_packet_loss, "real_packet_loss", &mut hit);
        sanitize_f32(&mut self.real_jitter, "real_jitter", &mut hit);
        sanitize_f32(&mut self.latitude, "latitude", &mut hit);
        sanitize_f32(&mut self.longitude, "longitude", &mut hit);
        sanitize_f32(&mut self.next_rtt, "next_rtt", &mut hit);
        sanitize_f32(&mut self.next_jitter, "next_jitter", &mut hit);
        sanitize_f32(&mut self.next_packet_loss, "next_packet_loss", &mut hit);
        sanitize_f32(&mut self.predicted_next_rtt, "predicted_next_rtt", &mut hit);
        for i in 0..self.num_near_relays.clamp(0, MAX_NEAR_RELAYS as i32) as usize {
            sanitize_f32(&mut self.near_relay_rtts[i], "near_relay_rtts", &mut hit);
            sanitize_f32(&mut self.near_relay_jitters[i], "near_relay_jitters", &mut hit);
            sanitize_f32(
                &mut self.near_relay_packet_losses[i],
                "near_relay_packet_losses",
                &mut hit,
            );
        }
        hit
    }
}

//! Record traits shared by every entry kind
//!
//! `Record` is the codec contract the publisher and forwarder are generic
//! over. `Storable` adds the data-hygiene hooks the sink runs before an
//! entry may enter the write buffer.

use crate::CodecError;

/// A versioned telemetry record with a fixed binary layout
///
/// Implementations serialize `version` first and gate every field added
/// in schema version `N` on `version >= N`. `decode` must reject payloads
/// written by a newer schema (`version > CURRENT_VERSION`) and any count
/// field above its declared capacity.
pub trait Record: Sized + Send + 'static {
    /// Short kind name used in logs and metrics ("billing", "beacon", ...)
    const KIND: &'static str;

    /// Newest schema version this build can read and write
    const CURRENT_VERSION: u32;

    /// Worst-case serialized size (every array at capacity, every string
    /// at maximum length)
    const MAX_BYTES: usize;

    /// Key used to pick a publisher shard; all records for one session
    /// share a key so per-shard ordering preserves session-local order
    fn shard_key(&self) -> u64;

    /// Serialize to the fixed wire layout
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    /// Deserialize from the fixed wire layout
    fn decode(data: &[u8]) -> Result<Self, CodecError>;
}

/// Sink-side hygiene for records bound for bulk storage
pub trait Storable {
    /// Reject structurally invalid records (zero required identifiers,
    /// out-of-band percentages). Returns the offending field name.
    fn validate(&self) -> Result<(), &'static str>;

    /// Zero any NaN or infinite float field, returning the names of the
    /// fields that were hit. Never fails; bad floats are data to count,
    /// not an error path.
    fn sanitize_floats(&mut self) -> Vec<&'static str>;
}

/// Force a float to zero when NaN or infinite, recording the field name
#[inline]
pub(crate) fn sanitize_f32(value: &mut f32, field: &'static str, hit: &mut Vec<&'static str>) {
    if !value.is_finite() {
        *value = 0.0;
        hit.push(field);
    }
}

/// Force a double to zero when NaN or infinite, recording the field name
#[inline]
pub(crate) fn sanitize_f64(value: &mut f64, field: &'static str, hit: &mut Vec<&'static str>) {
    if !value.is_finite() {
        *value = 0.0;
        hit.push(field);
    }
}

/// Clamp an i32 into `[min, max]`
#[inline]
pub(crate) fn clamp_i32(value: &mut i32, min: i32, max: i32) {
    if *value < min {
        *value = min;
    } else if *value > max {
        *value = max;
    }
}

/// Clamp a float into `[min, max]`; non-finite values pass through
/// untouched (sanitization, not clamping, handles those)
#[inline]
pub(crate) fn clamp_f32(value: &mut f32, min: f32, max: f32) {
    if *value < min {
        *value = min;
    } else if *value > max {
        *value = max;
    }
}

/// Truncate a string in place to at most `max` bytes on a char boundary
pub(crate) fn clamp_string(value: &mut String, max: usize) {
    if value.len() > max {
        let mut end = max;
        while end > 0 && !value.is_char_boundary(end) {
            end -= 1;
        }
        value.truncate(end);
    }
}

//! Low-level wire helpers for the fixed-layout record format
//!
//! `Writer` appends little-endian fields to a growing buffer; `Reader`
//! consumes them with bounds checks. Strings and bounded values carry a
//! field name so decode failures identify the offending field.

use crate::CodecError;

/// Appends fields to an owned buffer
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    /// Write a length-prefixed string, enforcing the field maximum
    pub(crate) fn string(
        &mut self,
        field: &'static str,
        value: &str,
        max: usize,
    ) -> Result<(), CodecError> {
        if value.len() > max {
            return Err(CodecError::string_too_long(field, value.len(), max));
        }
        self.u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Write a bounded count field, enforcing `0 <= count <= max`
    pub(crate) fn count(
        &mut self,
        field: &'static str,
        count: i32,
        max: usize,
    ) -> Result<usize, CodecError> {
        if count < 0 || count as usize > max {
            return Err(CodecError::count_out_of_range(field, count, max));
        }
        self.u32(count as u32);
        Ok(count as usize)
    }

    #[inline]
    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Consumes fields from a borrowed buffer with bounds checks
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.offset + n > self.data.len() {
            return Err(CodecError::too_short(self.offset + n, self.data.len()));
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    #[inline]
    pub(crate) fn u32(&mut self) -> Result<u32, CodecError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    #[inline]
    pub(crate) fn u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    #[inline]
    pub(crate) fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.u32()? as i32)
    }

    #[inline]
    pub(crate) fn f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_bits(self.u32()?))
    }

    #[inline]
    pub(crate) fn f64(&mut self) -> Result<f64, CodecError> {
        Ok(f64::from_bits(self.u64()?))
    }

    #[inline]
    pub(crate) fn bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.take(1)?[0] != 0)
    }

    /// Read a length-prefixed string, enforcing the field maximum before
    /// any allocation
    pub(crate) fn string(
        &mut self,
        field: &'static str,
        max: usize,
    ) -> Result<String, CodecError> {
        let len = self.u32()? as usize;
        if len > max {
            return Err(CodecError::string_too_long(field, len, max));
        }
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field })
    }

    /// Read a bounded count field, enforcing `count <= max`
    pub(crate) fn count(&mut self, field: &'static str, max: usize) -> Result<usize, CodecError> {
        let count = self.u32()?;
        if count as usize > max {
            return Err(CodecError::count_out_of_range(field, count as i32, max));
        }
        Ok(count as usize)
    }
}

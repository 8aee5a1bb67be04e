//! Byte-level primitives shared by the MessagePack codec.
//!
//! Distinct from a typical wire-frame decoder: reads are positional rather
//! than self-advancing, so a caller can peek or rewind without losing
//! already-visited bytes.

pub mod error;

use bytes::BufMut;

pub use error::WireError;

/// Positional, non-consuming big-endian reads over a byte slice.
///
/// Every method takes an explicit offset and returns the value alongside the
/// offset just past it; the slice itself is never mutated.
pub trait WireDecode {
    fn read_u8(&self, at: usize) -> Result<(u8, usize), WireError>;
    fn read_i8(&self, at: usize) -> Result<(i8, usize), WireError>;
    fn read_u16(&self, at: usize) -> Result<(u16, usize), WireError>;
    fn read_i16(&self, at: usize) -> Result<(i16, usize), WireError>;
    fn read_u32(&self, at: usize) -> Result<(u32, usize), WireError>;
    fn read_i32(&self, at: usize) -> Result<(i32, usize), WireError>;
    fn read_u64(&self, at: usize) -> Result<(u64, usize), WireError>;
    fn read_i64(&self, at: usize) -> Result<(i64, usize), WireError>;
    fn read_f32(&self, at: usize) -> Result<(f32, usize), WireError>;
    fn read_f64(&self, at: usize) -> Result<(f64, usize), WireError>;
    /// Borrows `len` bytes starting at `at`.
    fn read_slice(&self, at: usize, len: usize) -> Result<(&[u8], usize), WireError>;
}

impl WireDecode for [u8] {
    fn read_u8(&self, at: usize) -> Result<(u8, usize), WireError> {
        let (slice, next) = self.read_slice(at, 1)?;
        Ok((slice[0], next))
    }

    fn read_i8(&self, at: usize) -> Result<(i8, usize), WireError> {
        let (value, next) = self.read_u8(at)?;
        Ok((value as i8, next))
    }

    fn read_u16(&self, at: usize) -> Result<(u16, usize), WireError> {
        let (slice, next) = self.read_slice(at, 2)?;
        Ok((u16::from_be_bytes(slice.try_into().unwrap()), next))
    }

    fn read_i16(&self, at: usize) -> Result<(i16, usize), WireError> {
        let (value, next) = self.read_u16(at)?;
        Ok((value as i16, next))
    }

    fn read_u32(&self, at: usize) -> Result<(u32, usize), WireError> {
        let (slice, next) = self.read_slice(at, 4)?;
        Ok((u32::from_be_bytes(slice.try_into().unwrap()), next))
    }

    fn read_i32(&self, at: usize) -> Result<(i32, usize), WireError> {
        let (value, next) = self.read_u32(at)?;
        Ok((value as i32, next))
    }

    fn read_u64(&self, at: usize) -> Result<(u64, usize), WireError> {
        let (slice, next) = self.read_slice(at, 8)?;
        Ok((u64::from_be_bytes(slice.try_into().unwrap()), next))
    }

    fn read_i64(&self, at: usize) -> Result<(i64, usize), WireError> {
        let (value, next) = self.read_u64(at)?;
        Ok((value as i64, next))
    }

    fn read_f32(&self, at: usize) -> Result<(f32, usize), WireError> {
        let (slice, next) = self.read_slice(at, 4)?;
        Ok((f32::from_be_bytes(slice.try_into().unwrap()), next))
    }

    fn read_f64(&self, at: usize) -> Result<(f64, usize), WireError> {
        let (slice, next) = self.read_slice(at, 8)?;
        Ok((f64::from_be_bytes(slice.try_into().unwrap()), next))
    }

    fn read_slice(&self, at: usize, len: usize) -> Result<(&[u8], usize), WireError> {
        let end = at.checked_add(len).ok_or(WireError::BufferTooShort {
            expected: len,
            actual: self.len().saturating_sub(at),
        })?;
        if end > self.len() {
            return Err(WireError::BufferTooShort { expected: len, actual: self.len() - at.min(self.len()) });
        }
        Ok((&self[at..end], end))
    }
}

/// Big-endian appends to a growable buffer, named to mirror [`WireDecode`].
pub trait WireEncode {
    fn put_u8(&mut self, value: u8);
    fn put_i8(&mut self, value: i8);
    fn put_u16(&mut self, value: u16);
    fn put_i16(&mut self, value: i16);
    fn put_u32(&mut self, value: u32);
    fn put_i32(&mut self, value: i32);
    fn put_u64(&mut self, value: u64);
    fn put_i64(&mut self, value: i64);
    fn put_f32(&mut self, value: f32);
    fn put_f64(&mut self, value: f64);
}

impl WireEncode for bytes::BytesMut {
    fn put_u8(&mut self, value: u8) {
        BufMut::put_u8(self, value);
    }

    fn put_i8(&mut self, value: i8) {
        BufMut::put_i8(self, value);
    }

    fn put_u16(&mut self, value: u16) {
        BufMut::put_u16(self, value);
    }

    fn put_i16(&mut self, value: i16) {
        BufMut::put_i16(self, value);
    }

    fn put_u32(&mut self, value: u32) {
        BufMut::put_u32(self, value);
    }

    fn put_i32(&mut self, value: i32) {
        BufMut::put_i32(self, value);
    }

    fn put_u64(&mut self, value: u64) {
        BufMut::put_u64(self, value);
    }

    fn put_i64(&mut self, value: i64) {
        BufMut::put_i64(self, value);
    }

    fn put_f32(&mut self, value: f32) {
        BufMut::put_f32(self, value);
    }

    fn put_f64(&mut self, value: f64) {
        BufMut::put_f64(self, value);
    }
}

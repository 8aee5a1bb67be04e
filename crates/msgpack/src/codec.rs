//! The stateful buffer + cursor + pair-counter codec.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};
use wire::{WireDecode, WireEncode};

use crate::error::Error;
use crate::pack::Pack;
use crate::tag::{FIXARRAY_MAX, FIXMAP_MAX, Tag};
use crate::values::{FromMsgPack, ToMsgPack};

/// Encodes values to, and decodes values from, a MessagePack byte stream.
///
/// Writes append to the tail of an internal buffer. Reads advance an
/// explicit cursor from the head; [`Codec::peek`] and [`Codec::reset`] make
/// the cursor revisitable without discarding buffered bytes.
#[derive(Debug, Default)]
pub struct Codec {
    buf: BytesMut,
    cursor: usize,
    pairs: u32,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the buffer and zeroes the cursor and pair counter.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.pairs = 0;
    }

    /// Rewinds the read cursor to the start without touching the buffer.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Returns a copy of the buffered bytes and clears the codec.
    pub fn serialize(&mut self) -> Bytes {
        let out = Bytes::copy_from_slice(&self.buf);
        self.clear();
        out
    }

    /// Returns a copy of the buffered bytes, leaving all state intact.
    pub fn serialize_without_wipe(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    /// Replaces the buffer with `bytes` and resets the read cursor.
    pub fn deserialize(&mut self, bytes: impl Into<Bytes>) {
        self.buf = BytesMut::from(&bytes.into()[..]);
        self.cursor = 0;
        self.pairs = 0;
    }

    /// Classifies the next tag without advancing the cursor.
    ///
    /// Returns [`Tag::Reserved`] when the stream is exhausted.
    pub fn get_next_type(&self) -> Tag {
        match self.buf.get(self.cursor) {
            Some(&byte) => Tag::classify(byte),
            None => Tag::Reserved,
        }
    }

    /// Appends any scalar value using the narrowest-fit rule.
    pub fn add_value<T: ToMsgPack>(&mut self, value: &T) {
        value.to_msgpack(self);
    }

    /// Consumes one value of the requested scalar type.
    pub fn get_value<T: FromMsgPack>(&mut self) -> Result<T, Error> {
        T::from_msgpack(self)
    }

    /// Appends a key then a value, incrementing the pair counter.
    ///
    /// The pair counter is consumed by [`Codec::add_aggregate`] to size the
    /// outer map header once the caller's fields are flushed.
    pub fn add_pair<K: ToMsgPack, V: ToMsgPack>(&mut self, key: &K, value: &V) {
        self.add_value(key);
        self.add_value(value);
        self.pairs += 1;
    }

    /// Appends an array header declaring `len` elements. The caller is
    /// responsible for appending exactly `len` further values.
    pub fn add_array(&mut self, len: u32) {
        self.write_container_header(Tag::FixArray, FIXARRAY_MAX, Tag::Array16, Tag::Array32, len);
    }

    /// Appends a map header declaring `len` pairs. The caller is
    /// responsible for appending exactly `2 * len` further values.
    pub fn add_map(&mut self, len: u32) {
        self.write_container_header(Tag::FixMap, FIXMAP_MAX, Tag::Map16, Tag::Map32, len);
    }

    /// Consumes an array header and returns its element count.
    pub fn unpack_array(&mut self) -> Result<u32, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        if !tag.is_array_family() {
            return Err(Error::InvalidCast { tag: byte });
        }
        self.advance(1);
        self.read_container_len(tag, byte, FIXARRAY_MAX as u8)
    }

    /// Consumes a map header and returns its pair count.
    pub fn unpack_map(&mut self) -> Result<u32, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        if !tag.is_map_family() {
            return Err(Error::InvalidCast { tag: byte });
        }
        self.advance(1);
        self.read_container_len(tag, byte, FIXMAP_MAX as u8)
    }

    /// Appends a convenience array of scalar values (header plus elements).
    pub fn add_array_of<T: ToMsgPack>(&mut self, items: &[T]) {
        self.add_array(items.len() as u32);
        for item in items {
            self.add_value(item);
        }
    }

    /// Consumes an array of scalar values.
    pub fn get_array<T: FromMsgPack>(&mut self) -> Result<Vec<T>, Error> {
        let len = self.unpack_array()? as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.get_value::<T>()?);
        }
        Ok(out)
    }

    /// Appends a convenience map of scalar key/value pairs.
    pub fn add_map_of<K: ToMsgPack, V: ToMsgPack>(&mut self, pairs: &[(K, V)]) {
        self.add_map(pairs.len() as u32);
        for (key, value) in pairs {
            self.add_value(key);
            self.add_value(value);
        }
    }

    /// Consumes a map, rejecting duplicate keys.
    pub fn get_map<K, V>(&mut self) -> Result<std::collections::BTreeMap<K, V>, Error>
    where
        K: FromMsgPack + Ord,
        V: FromMsgPack,
    {
        let len = self.unpack_map()? as usize;
        let mut out = std::collections::BTreeMap::new();
        for _ in 0..len {
            let key = self.get_value::<K>()?;
            let value = self.get_value::<V>()?;
            out.insert(key, value);
        }
        Ok(out)
    }

    /// Consumes a map, preserving duplicate keys and insertion order.
    pub fn get_multimap<K, V>(&mut self) -> Result<Vec<(K, V)>, Error>
    where
        K: FromMsgPack,
        V: FromMsgPack,
    {
        let len = self.unpack_map()? as usize;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let key = self.get_value::<K>()?;
            let value = self.get_value::<V>()?;
            out.push((key, value));
        }
        Ok(out)
    }

    /// Appends raw binary data as a `bin8`/`bin16`/`bin32` value.
    pub fn add_bin(&mut self, data: &[u8]) {
        let len = data.len();
        if len <= u8::MAX as usize {
            self.write_tag(Tag::Bin8);
            self.put_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.write_tag(Tag::Bin16);
            self.put_u16(len as u16);
        } else {
            self.write_tag(Tag::Bin32);
            self.put_u32(len as u32);
        }
        self.buf.extend_from_slice(data);
    }

    /// Consumes a `bin8`/`bin16`/`bin32` value.
    pub fn get_bin(&mut self) -> Result<Bytes, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        let len = match tag {
            Tag::Bin8 => {
                self.advance(1);
                self.read_raw_u8()? as usize
            }
            Tag::Bin16 => {
                self.advance(1);
                self.read_raw_u16()? as usize
            }
            Tag::Bin32 => {
                self.advance(1);
                self.read_raw_u32()? as usize
            }
            _ => return Err(Error::InvalidCast { tag: byte }),
        };
        let bytes = self.read_raw_slice(len)?;
        Ok(Bytes::copy_from_slice(bytes))
    }

    /// Serializes a caller-defined aggregate as a map: the caller publishes
    /// its fields onto a fresh child codec via [`Pack::pack`], then the
    /// resulting pairs are wrapped in a map header sized to match.
    pub fn add_aggregate<T: Pack>(&mut self, value: &T) {
        let mut child = Codec::new();
        value.pack(&mut child);
        self.add_map(child.pairs);
        let body = child.serialize();
        self.buf.extend_from_slice(&body);
    }

    /// Appends a key then a nested aggregate value, incrementing the pair
    /// counter. Use this instead of manual `add_value` + `add_aggregate`
    /// calls when a [`Pack`] implementation nests another aggregate as one
    /// of its fields, so the enclosing map header still counts correctly.
    pub fn add_pair_aggregate<K: ToMsgPack, T: Pack>(&mut self, key: &K, value: &T) {
        self.add_value(key);
        self.add_aggregate(value);
        self.pairs += 1;
    }

    /// Appends a key then an array of scalar values, incrementing the pair
    /// counter. Use this instead of manual `add_value` + `add_array_of`
    /// calls when a [`Pack`] implementation publishes an array-valued field,
    /// so the enclosing map header still counts correctly.
    pub fn add_pair_array<K: ToMsgPack, T: ToMsgPack>(&mut self, key: &K, items: &[T]) {
        self.add_value(key);
        self.add_array_of(items);
        self.pairs += 1;
    }

    /// Advances the cursor past the next `count` complete values without
    /// decoding their payloads. Stops early if the stream runs out, even if
    /// fewer than `count` values were skipped.
    pub fn skip_value(&mut self, count: usize) -> Result<(), Error> {
        for _ in 0..count {
            if self.cursor >= self.buf.len() {
                break;
            }
            self.skip_one()?;
        }
        Ok(())
    }

    fn skip_one(&mut self) -> Result<(), Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        self.advance(1);
        match tag {
            Tag::PositiveFixInt | Tag::NegativeFixInt | Tag::Nil | Tag::False | Tag::True => {}
            Tag::Uint8 | Tag::Int8 => self.advance(1),
            Tag::Uint16 | Tag::Int16 => self.advance(2),
            Tag::Uint32 | Tag::Int32 | Tag::Float32 => self.advance(4),
            Tag::Uint64 | Tag::Int64 | Tag::Float64 => self.advance(8),
            Tag::FixStr => {
                let len = (byte & crate::tag::FIXSTR_LEN_MASK) as usize;
                self.advance(len);
            }
            Tag::Str8 | Tag::Bin8 => {
                let len = self.read_raw_u8()? as usize;
                self.advance(len);
            }
            Tag::Str16 | Tag::Bin16 => {
                let len = self.read_raw_u16()? as usize;
                self.advance(len);
            }
            Tag::Str32 | Tag::Bin32 => {
                let len = self.read_raw_u32()? as usize;
                self.advance(len);
            }
            Tag::FixArray => {
                let len = (byte & crate::tag::FIXARRAY_LEN_MASK) as usize;
                self.skip_value(len)?;
            }
            Tag::Array16 => {
                let len = self.read_raw_u16()? as usize;
                self.skip_value(len)?;
            }
            Tag::Array32 => {
                let len = self.read_raw_u32()? as usize;
                self.skip_value(len)?;
            }
            Tag::FixMap => {
                let len = (byte & crate::tag::FIXMAP_LEN_MASK) as usize;
                self.skip_value(2 * len)?;
            }
            Tag::Map16 => {
                let len = self.read_raw_u16()? as usize;
                self.skip_value(2 * len)?;
            }
            Tag::Map32 => {
                let len = self.read_raw_u32()? as usize;
                self.skip_value(2 * len)?;
            }
            Tag::Reserved
            | Tag::Ext8
            | Tag::Ext16
            | Tag::Ext32
            | Tag::FixExt1
            | Tag::FixExt2
            | Tag::FixExt4
            | Tag::FixExt8
            | Tag::FixExt16 => {
                return Err(Error::UnknownType { tag: byte });
            }
        }
        Ok(())
    }

    // ---- internal helpers ----

    pub(crate) fn write_tag(&mut self, tag: Tag) {
        WireEncode::put_u8(&mut self.buf, tag as u8);
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        WireEncode::put_u8(&mut self.buf, value);
    }

    pub(crate) fn put_i8(&mut self, value: i8) {
        WireEncode::put_i8(&mut self.buf, value);
    }

    pub(crate) fn put_u16(&mut self, value: u16) {
        WireEncode::put_u16(&mut self.buf, value);
    }

    pub(crate) fn put_i16(&mut self, value: i16) {
        WireEncode::put_i16(&mut self.buf, value);
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        WireEncode::put_u32(&mut self.buf, value);
    }

    pub(crate) fn put_i32(&mut self, value: i32) {
        WireEncode::put_i32(&mut self.buf, value);
    }

    pub(crate) fn put_u64(&mut self, value: u64) {
        WireEncode::put_u64(&mut self.buf, value);
    }

    pub(crate) fn put_i64(&mut self, value: i64) {
        WireEncode::put_i64(&mut self.buf, value);
    }

    pub(crate) fn put_f32(&mut self, value: f32) {
        WireEncode::put_f32(&mut self.buf, value);
    }

    pub(crate) fn put_f64(&mut self, value: f64) {
        WireEncode::put_f64(&mut self.buf, value);
    }

    pub(crate) fn put_slice(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Writes the narrowest-fitting integer encoding for a signed-typed
    /// value. Non-negative values beyond the fixint range use the unsigned
    /// ladder (uint8/16/32/64), which is always at least as narrow as the
    /// signed ladder for the same magnitude; only genuinely negative values
    /// outside the negative-fixint range use int8/16/32/64.
    pub(crate) fn write_signed(&mut self, value: i64) {
        if (-32..=127).contains(&value) {
            trace!(value, tag = "fixint", "dispatching signed write");
            self.put_u8(value as i8 as u8);
        } else if value >= 0 {
            trace!(value, "dispatching signed write to unsigned ladder");
            self.write_unsigned(value as u64);
        } else if let Ok(v) = i8::try_from(value) {
            trace!(value, tag = "int8", "dispatching signed write");
            self.write_tag(Tag::Int8);
            self.put_i8(v);
        } else if let Ok(v) = i16::try_from(value) {
            trace!(value, tag = "int16", "dispatching signed write");
            self.write_tag(Tag::Int16);
            self.put_i16(v);
        } else if let Ok(v) = i32::try_from(value) {
            trace!(value, tag = "int32", "dispatching signed write");
            self.write_tag(Tag::Int32);
            self.put_i32(v);
        } else {
            trace!(value, tag = "int64", "dispatching signed write");
            self.write_tag(Tag::Int64);
            self.put_i64(value);
        }
    }

    /// Writes the narrowest-fitting unsigned integer encoding.
    pub(crate) fn write_unsigned(&mut self, value: u64) {
        if value <= 127 {
            trace!(value, tag = "fixint", "dispatching unsigned write");
            self.put_u8(value as u8);
        } else if let Ok(v) = u8::try_from(value) {
            trace!(value, tag = "uint8", "dispatching unsigned write");
            self.write_tag(Tag::Uint8);
            self.put_u8(v);
        } else if let Ok(v) = u16::try_from(value) {
            trace!(value, tag = "uint16", "dispatching unsigned write");
            self.write_tag(Tag::Uint16);
            self.put_u16(v);
        } else if let Ok(v) = u32::try_from(value) {
            trace!(value, tag = "uint32", "dispatching unsigned write");
            self.write_tag(Tag::Uint32);
            self.put_u32(v);
        } else {
            trace!(value, tag = "uint64", "dispatching unsigned write");
            self.write_tag(Tag::Uint64);
            self.put_u64(value);
        }
    }

    /// Reads the next integer, sign/zero-extended into an `i128`
    /// intermediate wide enough to hold any tag family losslessly.
    pub(crate) fn read_int_as<T>(&mut self) -> Result<T, Error>
    where
        T: TryFrom<i128>,
    {
        let tag_byte = self.peek_byte()?;
        let value = self.read_int()?;
        T::try_from(value).map_err(|_| Error::InvalidCast { tag: tag_byte })
    }

    fn read_int(&mut self) -> Result<i128, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        trace!(tag = ?tag, byte, "dispatching integer read");
        match tag {
            Tag::PositiveFixInt => {
                self.advance(1);
                Ok(byte as i128)
            }
            Tag::NegativeFixInt => {
                self.advance(1);
                Ok((byte as i8) as i128)
            }
            Tag::Uint8 => {
                self.advance(1);
                Ok(self.read_raw_u8()? as i128)
            }
            Tag::Uint16 => {
                self.advance(1);
                Ok(self.read_raw_u16()? as i128)
            }
            Tag::Uint32 => {
                self.advance(1);
                Ok(self.read_raw_u32()? as i128)
            }
            Tag::Uint64 => {
                self.advance(1);
                Ok(self.read_raw_u64()? as i128)
            }
            Tag::Int8 => {
                self.advance(1);
                Ok(self.read_raw_i8()? as i128)
            }
            Tag::Int16 => {
                self.advance(1);
                Ok(self.read_raw_i16()? as i128)
            }
            Tag::Int32 => {
                self.advance(1);
                Ok(self.read_raw_i32()? as i128)
            }
            Tag::Int64 => {
                self.advance(1);
                Ok(self.read_raw_i64()? as i128)
            }
            _ => {
                debug!(byte, "integer read rejected tag");
                Err(Error::InvalidCast { tag: byte })
            }
        }
    }

    /// Reads a strict `float32`.
    pub(crate) fn read_f32_strict(&mut self) -> Result<f32, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        trace!(tag = ?tag, byte, "dispatching float32 read");
        if tag != Tag::Float32 {
            debug!(byte, "float32 read rejected tag");
            return Err(Error::InvalidCast { tag: byte });
        }
        self.advance(1);
        self.read_raw_f32()
    }

    /// Reads a `float64`, or safely widens a `float32`.
    pub(crate) fn read_f64_widening(&mut self) -> Result<f64, Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        trace!(tag = ?tag, byte, "dispatching float64 read");
        match tag {
            Tag::Float64 => {
                self.advance(1);
                self.read_raw_f64()
            }
            Tag::Float32 => {
                self.advance(1);
                Ok(self.read_raw_f32()? as f64)
            }
            _ => {
                debug!(byte, "float64 read rejected tag");
                Err(Error::InvalidCast { tag: byte })
            }
        }
    }

    /// Reads a bool tag.
    pub(crate) fn read_bool(&mut self) -> Result<bool, Error> {
        let byte = self.peek_byte()?;
        match Tag::classify(byte) {
            Tag::True => {
                self.advance(1);
                Ok(true)
            }
            Tag::False => {
                self.advance(1);
                Ok(false)
            }
            _ => Err(Error::InvalidCast { tag: byte }),
        }
    }

    /// Reads a nil tag.
    pub(crate) fn read_nil(&mut self) -> Result<(), Error> {
        let byte = self.peek_byte()?;
        if Tag::classify(byte) != Tag::Nil {
            return Err(Error::InvalidCast { tag: byte });
        }
        self.advance(1);
        Ok(())
    }

    /// Reads a text-or-binary payload: accepts fixstr/str8/16/32 and
    /// bin8/16/32, per the reader's combined family for string targets.
    pub(crate) fn read_str_or_bin_bytes(&mut self) -> Result<(u8, Vec<u8>), Error> {
        let byte = self.peek_byte()?;
        let tag = Tag::classify(byte);
        let len = match tag {
            Tag::FixStr => {
                self.advance(1);
                (byte & crate::tag::FIXSTR_LEN_MASK) as usize
            }
            Tag::Str8 | Tag::Bin8 => {
                self.advance(1);
                self.read_raw_u8()? as usize
            }
            Tag::Str16 | Tag::Bin16 => {
                self.advance(1);
                self.read_raw_u16()? as usize
            }
            Tag::Str32 | Tag::Bin32 => {
                self.advance(1);
                self.read_raw_u32()? as usize
            }
            _ => return Err(Error::InvalidCast { tag: byte }),
        };
        Ok((byte, self.read_raw_slice(len)?.to_vec()))
    }

    fn write_container_header(
        &mut self,
        fix_tag: Tag,
        fix_max: usize,
        tag16: Tag,
        tag32: Tag,
        len: u32,
    ) {
        if (len as usize) <= fix_max {
            self.put_u8(fix_tag as u8 | len as u8);
        } else if len <= u16::MAX as u32 {
            self.write_tag(tag16);
            self.put_u16(len as u16);
        } else {
            self.write_tag(tag32);
            self.put_u32(len);
        }
    }

    fn read_container_len(&mut self, tag: Tag, header_byte: u8, fix_mask: u8) -> Result<u32, Error> {
        match tag {
            Tag::FixArray | Tag::FixMap => Ok((header_byte & fix_mask) as u32),
            Tag::Array16 | Tag::Map16 => Ok(self.read_raw_u16()? as u32),
            Tag::Array32 | Tag::Map32 => self.read_raw_u32(),
            _ => unreachable!("caller already validated the tag family"),
        }
    }

    fn peek_byte(&self) -> Result<u8, Error> {
        self.buf.get(self.cursor).copied().ok_or(Error::EmptyStream)
    }

    fn advance(&mut self, n: usize) {
        self.cursor += n;
    }

    fn read_raw_u8(&mut self) -> Result<u8, Error> {
        let (v, next) = WireDecode::read_u8(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_i8(&mut self) -> Result<i8, Error> {
        let (v, next) = WireDecode::read_i8(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_u16(&mut self) -> Result<u16, Error> {
        let (v, next) = WireDecode::read_u16(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_i16(&mut self) -> Result<i16, Error> {
        let (v, next) = WireDecode::read_i16(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_u32(&mut self) -> Result<u32, Error> {
        let (v, next) = WireDecode::read_u32(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_i32(&mut self) -> Result<i32, Error> {
        let (v, next) = WireDecode::read_i32(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_u64(&mut self) -> Result<u64, Error> {
        let (v, next) = WireDecode::read_u64(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_i64(&mut self) -> Result<i64, Error> {
        let (v, next) = WireDecode::read_i64(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_f32(&mut self) -> Result<f32, Error> {
        let (v, next) = WireDecode::read_f32(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, true))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_f64(&mut self) -> Result<f64, Error> {
        let (v, next) = WireDecode::read_f64(self.buf.as_ref(), self.cursor)
            .map_err(|e| Error::from_wire(e, true))?;
        self.cursor = next;
        Ok(v)
    }

    fn read_raw_slice(&mut self, len: usize) -> Result<&[u8], Error> {
        let (slice, next) = WireDecode::read_slice(self.buf.as_ref(), self.cursor, len)
            .map_err(|e| Error::from_wire(e, false))?;
        self.cursor = next;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_scenario_nil_bool_small_ints() {
        let mut codec = Codec::new();
        codec.add_value(&());
        codec.add_value(&true);
        codec.add_value(&false);
        codec.add_value(&1i32);
        codec.add_value(&(-31i32));
        let bytes = codec.serialize();
        assert_eq!(bytes.as_ref(), &[0xc0, 0xc2, 0xc3, 0x01, 0xe1]);
    }

    #[test]
    fn uint8_is_tagged_explicitly() {
        let mut codec = Codec::new();
        codec.add_value(&255u32);
        let bytes = codec.serialize();
        assert_eq!(bytes.as_ref(), &[0xcc, 0xff]);
        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.get_next_type(), Tag::Uint8);
        assert_eq!(reader.get_value::<u8>().unwrap(), 255);
    }

    #[test]
    fn str8_header_for_36_byte_string() {
        let text = "123456789012345678901234567890123456";
        assert_eq!(text.len(), 36);
        let mut codec = Codec::new();
        codec.add_value(&text);
        let bytes = codec.serialize();
        assert_eq!(&bytes[..2], &[0xd9, 0x24]);
        assert_eq!(&bytes[2..], text.as_bytes());

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.get_next_type(), Tag::Str8);
        assert_eq!(reader.get_value::<String>().unwrap(), text);
    }

    #[test]
    fn array_of_mixed_width_ints() {
        let mut codec = Codec::new();
        codec.add_array_of(&[10i32, 11, -21, 243]);
        let bytes = codec.serialize();
        assert_eq!(bytes[0], 0x94);
        assert_eq!(&bytes[1..3], &[0x0a, 0x0b]);
        assert_eq!(bytes[3], 0xeb); // -21 as negative fixint
        assert_eq!(&bytes[4..], &[0xcc, 0xf3]);

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        let values: Vec<i32> = reader.get_array().unwrap();
        assert_eq!(values, vec![10, 11, -21, 243]);
    }

    #[test]
    fn map_of_int_to_string() {
        let mut codec = Codec::new();
        codec.add_map_of(&[(1i32, "Test"), (2, "Hallo"), (3, "Hallo Test")]);
        let bytes = codec.serialize();
        assert_eq!(bytes[0], 0x83);

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        let map = reader.get_map::<i32, String>().unwrap();
        assert_eq!(map.get(&1).unwrap(), "Test");
        assert_eq!(map.get(&2).unwrap(), "Hallo");
        assert_eq!(map.get(&3).unwrap(), "Hallo Test");
    }

    #[test]
    fn skip_value_advances_past_array_and_leaves_scalar() {
        let mut codec = Codec::new();
        codec.add_array(5);
        codec.add_value(&"test");
        codec.add_value(&5i32);
        codec.add_value(&256i32);
        codec.add_value(&5.0f64);
        codec.add_value(&"Lol");
        codec.add_value(&42i32);
        let bytes = codec.serialize();

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        reader.skip_value(1).unwrap();
        assert_eq!(reader.get_next_type(), Tag::PositiveFixInt);
        assert_eq!(reader.get_value::<i32>().unwrap(), 42);
    }

    #[test]
    fn reset_then_skip_all_reaches_end() {
        let mut codec = Codec::new();
        codec.add_array(5);
        codec.add_value(&"test");
        codec.add_value(&5i32);
        codec.add_value(&256i32);
        codec.add_value(&5.0f64);
        codec.add_value(&"Lol");
        codec.add_value(&42i32);
        let bytes = codec.serialize();

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        reader.skip_value(1).unwrap();
        reader.reset();
        reader.skip_value(5).unwrap();
        assert_eq!(reader.get_next_type(), Tag::Reserved);
    }

    #[test]
    fn empty_string_encodes_as_nil() {
        let mut codec = Codec::new();
        codec.add_value(&"");
        let bytes = codec.serialize();
        assert_eq!(bytes.as_ref(), &[0xc0]);
    }

    #[test]
    fn narrowing_overflow_raises_invalid_cast() {
        let mut codec = Codec::new();
        codec.add_value(&300i32);
        let bytes = codec.serialize();
        let mut reader = Codec::new();
        reader.deserialize(bytes);
        let result = reader.get_value::<u8>();
        assert!(matches!(result, Err(Error::InvalidCast { .. })));
    }

    #[test]
    fn float32_target_rejects_float64_tag() {
        let mut codec = Codec::new();
        codec.add_value(&1.5f64);
        let bytes = codec.serialize();
        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert!(matches!(reader.get_value::<f32>(), Err(Error::InvalidCast { .. })));
    }

    #[test]
    fn float64_target_widens_float32() {
        let mut codec = Codec::new();
        codec.add_value(&1.5f32);
        let bytes = codec.serialize();
        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.get_value::<f64>().unwrap(), 1.5f64);
    }

    #[test]
    fn add_pair_array_counts_as_a_single_pair() {
        struct Sensor {
            name: &'static str,
            tags: Vec<i32>,
        }

        impl Pack for Sensor {
            fn pack(&self, codec: &mut Codec) {
                codec.add_pair(&"name", &self.name);
                codec.add_pair_array(&"tags", &self.tags);
            }
        }

        let sensor = Sensor { name: "a", tags: vec![1, 2, 3] };
        let mut codec = Codec::new();
        codec.add_aggregate(&sensor);
        let bytes = codec.serialize();
        assert_eq!(bytes[0], 0x80 | 2);

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.unpack_map().unwrap(), 2);
        assert_eq!(reader.get_value::<String>().unwrap(), "name");
        assert_eq!(reader.get_value::<String>().unwrap(), "a");
        assert_eq!(reader.get_value::<String>().unwrap(), "tags");
        let tags: Vec<i32> = reader.get_array().unwrap();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn serialize_without_wipe_preserves_state() {
        let mut codec = Codec::new();
        codec.add_value(&1i32);
        let copy = codec.serialize_without_wipe();
        assert_eq!(copy.as_ref(), &[0x01]);
        codec.add_value(&2i32);
        let full = codec.serialize();
        assert_eq!(full.as_ref(), &[0x01, 0x02]);
    }

    #[test]
    fn get_value_on_empty_stream_is_empty_stream_error() {
        let mut reader = Codec::new();
        assert!(matches!(reader.get_value::<i32>(), Err(Error::EmptyStream)));
    }

    #[test]
    fn skip_unknown_tag_raises_unknown_type() {
        let mut codec = Codec::new();
        codec.deserialize(Bytes::from_static(&[0xc7, 0x00]));
        assert!(matches!(codec.skip_value(1), Err(Error::UnknownType { tag: 0xc7 })));
    }
}

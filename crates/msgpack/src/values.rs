//! Scalar encode/decode traits.
//!
//! Arrays, maps, multimaps, and user aggregates are deliberately not traits
//! here: a blanket `impl<T: ToMsgPack> ToMsgPack for Vec<T>` would collide
//! under Rust's coherence rules with a concrete `Vec<u8>` binary impl and
//! with a `Vec<(K, V)>` multimap impl. They are instead explicit generic
//! methods on [`crate::Codec`] (`add_array`, `add_map_of`, `get_array`,
//! `get_map`, `get_multimap`).

use crate::codec::Codec;
use crate::error::Error;
use crate::tag::Tag;

/// Encodes a scalar value onto a [`Codec`] using the narrowest-fit rule.
pub trait ToMsgPack {
    fn to_msgpack(&self, codec: &mut Codec);
}

/// Decodes a scalar value from a [`Codec`].
pub trait FromMsgPack: Sized {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error>;
}

macro_rules! impl_signed_int {
    ($($t:ty),+) => {
        $(
            impl ToMsgPack for $t {
                fn to_msgpack(&self, codec: &mut Codec) {
                    codec.write_signed(*self as i64);
                }
            }

            impl FromMsgPack for $t {
                fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
                    codec.read_int_as::<$t>()
                }
            }
        )+
    };
}

macro_rules! impl_unsigned_int {
    ($($t:ty),+) => {
        $(
            impl ToMsgPack for $t {
                fn to_msgpack(&self, codec: &mut Codec) {
                    codec.write_unsigned(*self as u64);
                }
            }

            impl FromMsgPack for $t {
                fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
                    codec.read_int_as::<$t>()
                }
            }
        )+
    };
}

impl_signed_int!(i8, i16, i32, i64);
impl_unsigned_int!(u8, u16, u32, u64);

impl ToMsgPack for bool {
    fn to_msgpack(&self, codec: &mut Codec) {
        codec.write_tag(if *self { Tag::True } else { Tag::False });
    }
}

impl FromMsgPack for bool {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        codec.read_bool()
    }
}

impl ToMsgPack for () {
    fn to_msgpack(&self, codec: &mut Codec) {
        codec.write_tag(Tag::Nil);
    }
}

impl FromMsgPack for () {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        codec.read_nil()
    }
}

impl ToMsgPack for f32 {
    fn to_msgpack(&self, codec: &mut Codec) {
        codec.write_tag(Tag::Float32);
        codec.put_f32(*self);
    }
}

impl FromMsgPack for f32 {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        codec.read_f32_strict()
    }
}

impl ToMsgPack for f64 {
    fn to_msgpack(&self, codec: &mut Codec) {
        codec.write_tag(Tag::Float64);
        codec.put_f64(*self);
    }
}

impl FromMsgPack for f64 {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        codec.read_f64_widening()
    }
}

/// Encodes an empty string as nil, matching the source's observable quirk.
fn write_str(codec: &mut Codec, bytes: &[u8]) {
    if bytes.is_empty() {
        codec.write_tag(Tag::Nil);
        return;
    }
    let len = bytes.len();
    if len <= crate::tag::FIXSTR_MAX {
        codec.put_u8(Tag::FixStr as u8 | len as u8);
    } else if len <= u8::MAX as usize {
        codec.write_tag(Tag::Str8);
        codec.put_u8(len as u8);
    } else if len <= u16::MAX as usize {
        codec.write_tag(Tag::Str16);
        codec.put_u16(len as u16);
    } else {
        codec.write_tag(Tag::Str32);
        codec.put_u32(len as u32);
    }
    codec.put_slice(bytes);
}

impl ToMsgPack for &str {
    fn to_msgpack(&self, codec: &mut Codec) {
        write_str(codec, self.as_bytes());
    }
}

impl ToMsgPack for String {
    fn to_msgpack(&self, codec: &mut Codec) {
        write_str(codec, self.as_bytes());
    }
}

impl FromMsgPack for String {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        let (tag, bytes) = codec.read_str_or_bin_bytes()?;
        String::from_utf8(bytes).map_err(|_| Error::InvalidCast { tag })
    }
}

impl<T: ToMsgPack> ToMsgPack for Option<T> {
    fn to_msgpack(&self, codec: &mut Codec) {
        match self {
            Some(value) => value.to_msgpack(codec),
            None => codec.write_tag(Tag::Nil),
        }
    }
}

impl<T: FromMsgPack> FromMsgPack for Option<T> {
    fn from_msgpack(codec: &mut Codec) -> Result<Self, Error> {
        if codec.get_next_type() == Tag::Nil {
            codec.read_nil()?;
            return Ok(None);
        }
        Ok(Some(T::from_msgpack(codec)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_roundtrips_via_nil() {
        let mut codec = Codec::new();
        codec.add_value(&None::<i32>);
        let bytes = codec.serialize();
        assert_eq!(bytes.as_ref(), &[0xc0]);

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.get_value::<Option<i32>>().unwrap(), None);
    }

    #[test]
    fn option_some_roundtrips_through_inner_type() {
        let mut codec = Codec::new();
        codec.add_value(&Some(7i32));
        let bytes = codec.serialize();

        let mut reader = Codec::new();
        reader.deserialize(bytes);
        assert_eq!(reader.get_value::<Option<i32>>().unwrap(), Some(7));
    }

    #[test]
    fn unit_roundtrips_as_nil() {
        let mut codec = Codec::new();
        codec.add_value(&());
        let bytes = codec.serialize();
        let mut reader = Codec::new();
        reader.deserialize(bytes);
        reader.get_value::<()>().unwrap();
    }

    #[test]
    fn negative_fixint_boundaries() {
        let mut codec = Codec::new();
        codec.add_value(&(-32i32));
        codec.add_value(&(-33i32));
        let bytes = codec.serialize();
        assert_eq!(bytes[0], 0xe0);
        assert_eq!(bytes[1], 0xd0); // int8 tag, since -33 is below the neg-fixint floor
    }

    #[test]
    fn randomized_i64_roundtrip_across_width_boundaries() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let value: i64 = rng.gen();
            let mut codec = Codec::new();
            codec.add_value(&value);
            let bytes = codec.serialize();
            let mut reader = Codec::new();
            reader.deserialize(bytes);
            assert_eq!(reader.get_value::<i64>().unwrap(), value);
        }
    }

    #[test]
    fn randomized_u64_roundtrip_across_width_boundaries() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let value: u64 = rng.gen();
            let mut codec = Codec::new();
            codec.add_value(&value);
            let bytes = codec.serialize();
            let mut reader = Codec::new();
            reader.deserialize(bytes);
            assert_eq!(reader.get_value::<u64>().unwrap(), value);
        }
    }

    #[test]
    fn randomized_string_roundtrip_across_length_boundaries() {
        use rand::Rng;

        let mut rng = rand::thread_rng();

        // Empty string is excluded here: it deliberately encodes as nil (see
        // `write_str`), which `empty_string_encodes_as_nil` already covers.
        let lengths = [1usize, 31, 32, 255, 256, 65535, 65536];
        for &len in &lengths {
            let text: String = (0..len).map(|_| rng.sample(rand::distributions::Alphanumeric) as char).collect();
            let mut codec = Codec::new();
            codec.add_value(&text);
            let bytes = codec.serialize();
            let mut reader = Codec::new();
            reader.deserialize(bytes);
            assert_eq!(reader.get_value::<String>().unwrap(), text);
        }
    }
}

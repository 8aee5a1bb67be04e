//! A self-contained MessagePack encoder/decoder.
//!
//! [`Codec`] owns a write buffer and a read cursor. Scalars go through
//! [`ToMsgPack`]/[`FromMsgPack`]; arrays, maps, and multimaps are explicit
//! generic methods on `Codec` rather than trait impls (see [`values`] for
//! why); user-defined aggregates implement [`Pack`] and go through
//! [`Codec::add_aggregate`].
//!
//! The extension type family (`0xc7..0xc9`, `0xd4..0xd8`) is recognized by
//! [`tag::Tag`] but never produced or consumed.

pub mod codec;
pub mod error;
pub mod pack;
pub mod tag;
pub mod values;

pub use codec::Codec;
pub use error::Error;
pub use pack::Pack;
pub use tag::Tag;
pub use values::{FromMsgPack, ToMsgPack};

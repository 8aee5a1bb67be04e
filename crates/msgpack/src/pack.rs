//! The user-aggregate serialization hook.

use crate::codec::Codec;

/// Implemented by caller-defined types that want to serialize as a
/// MessagePack map. Implementations publish their fields with any number of
/// [`Codec::add_pair`] calls; [`Codec::add_aggregate`] wraps the result in a
/// correctly-sized map header.
///
/// Not connected to [`crate::ToMsgPack`] via a blanket impl: a blanket
/// `impl<T: Pack> ToMsgPack for T` would conflict with the concrete scalar
/// impls under Rust's coherence rules, so aggregates go through
/// `add_aggregate` explicitly instead of `add_value`.
pub trait Pack {
    fn pack(&self, codec: &mut Codec);
}

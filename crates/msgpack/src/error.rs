/// Error returned by a failed read or skip on a [`crate::Codec`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid cast: next tag {tag:#x} does not match the requested type")]
    InvalidCast { tag: u8 },

    #[error("empty stream: no bytes remain to read")]
    EmptyStream,

    #[error("invalid floating point: expected {expected} payload bytes, got {actual}")]
    InvalidFloatingPoint { expected: usize, actual: usize },

    #[error("unknown type: byte {tag:#x} does not match any known format tag")]
    UnknownType { tag: u8 },
}

impl Error {
    /// Maps a short-buffer condition from the byte layer to the codec-level
    /// kind appropriate for what was being decoded.
    pub(crate) fn from_wire(error: wire::WireError, while_decoding_float: bool) -> Error {
        let wire::WireError::BufferTooShort { expected, actual } = error;
        if while_decoding_float {
            Error::InvalidFloatingPoint { expected, actual }
        } else {
            Error::EmptyStream
        }
    }
}

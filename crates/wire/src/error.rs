/// Error returned when reading a typed field from a byte slice fails.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}

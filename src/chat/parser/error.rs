//! SSE stream decoding error definitions

use thiserror::Error;

/// Decode error types
///
/// Malformed frames are never errors: they simply yield no payloads.
/// The only failure is the buffer guard tripping on undelimited input.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Buffered, not-yet-delimited text exceeds the limit
    #[error("Buffer overflow: {size} bytes (max {max})")]
    BufferOverflow { size: usize, max: usize },
    /// Decoder was stopped by an earlier overflow
    #[error("Decoder stopped after buffer overflow")]
    Stopped,
}

/// Decode result type
pub type DecodeResult<T> = Result<T, DecodeError>;

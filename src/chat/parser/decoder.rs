//! SSE streaming decoder
//!
//! Turns arbitrarily split network chunks into complete frames
//!
//! ## State Machine Design
//!
//! ```text
//! ┌─────────────────┐
//! │      Ready      │  (Initial state, ready to receive data)
//! └────────┬────────┘
//!          │ feed() provides bytes
//!          ↓
//!   UTF-8 decode (incomplete trailing sequence kept for the next feed)
//!          │
//!   measure text after the last `\n\n`
//!          │
//!     ┌────┴────────────┐
//!     ↓                 ↓
//!  [Fits]          [Over limit]
//!     │                 │
//!     ↓                 ↓
//! ┌─────────┐     ┌────────────┐
//! │  Ready  │     │   Stopped  │ (Terminal state)
//! └─────────┘     └────────────┘
//! ```
//!
//! `decode()` only ever hands out frames whose `\n\n` terminator has been
//! seen, so a frame split across chunks (including mid-delimiter or
//! mid-codepoint) comes out exactly as it would from a single read.

use super::error::{DecodeError, DecodeResult};
use super::frame::{FRAME_DELIMITER, Frame};
use bytes::{Buf, BytesMut};

/// Default maximum buffer size (16 MB)
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Default initial buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// Decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Ready, can receive data
    Ready,
    /// Stopped (buffer overflow)
    Stopped,
}

/// Streaming SSE frame decoder
///
/// # Example
///
/// ```rust,ignore
/// let mut decoder = StreamDecoder::new();
/// decoder.feed(chunk)?;
/// for frame in decoder.decode_iter() {
///     for payload in frame.payloads() {
///         println!("payload: {}", payload);
///     }
/// }
/// ```
pub struct StreamDecoder {
    /// Bytes of an incomplete UTF-8 sequence at the end of the last chunk
    pending: BytesMut,
    /// Decoded text not yet closed by a delimiter
    text: String,
    /// Current state
    state: DecoderState,
    /// Number of frames decoded
    frames_decoded: usize,
    /// Invalid byte sequences replaced with U+FFFD
    replacements: usize,
    /// Maximum buffer size
    max_buffer_size: usize,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    /// Create new decoder
    pub fn new() -> Self {
        Self::with_config(DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_BUFFER_SIZE)
    }

    /// Create decoder with custom configuration
    pub fn with_config(capacity: usize, max_buffer_size: usize) -> Self {
        Self {
            pending: BytesMut::with_capacity(4),
            text: String::with_capacity(capacity),
            state: DecoderState::Ready,
            frames_decoded: 0,
            replacements: 0,
            max_buffer_size,
        }
    }

    /// Feed bytes to decoder
    ///
    /// Terminated frames never count against the limit, only the text after
    /// the last delimiter does.
    ///
    /// # Returns
    /// - `Ok(())` - Bytes decoded into the text buffer
    /// - `Err(BufferOverflow)` - Undelimited text exceeds the limit, decoder stops
    pub fn feed(&mut self, data: &[u8]) -> DecodeResult<()> {
        if self.state == DecoderState::Stopped {
            return Err(DecodeError::Stopped);
        }

        self.pending.extend_from_slice(data);
        self.decode_pending();

        let undelimited = self.undelimited_len();
        if undelimited > self.max_buffer_size {
            self.state = DecoderState::Stopped;
            tracing::error!(
                "Decoder stopped: {} undelimited bytes exceed limit of {}",
                undelimited,
                self.max_buffer_size
            );
            return Err(DecodeError::BufferOverflow {
                size: undelimited,
                max: self.max_buffer_size,
            });
        }

        Ok(())
    }

    /// Bytes buffered after the last frame delimiter
    fn undelimited_len(&self) -> usize {
        let closed = self
            .text
            .rfind(FRAME_DELIMITER)
            .map(|end| end + FRAME_DELIMITER.len())
            .unwrap_or(0);
        self.text.len() - closed + self.pending.len()
    }

    /// Move every complete UTF-8 sequence from `pending` into `text`
    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.text
                        .push_str(std::str::from_utf8(&self.pending[..valid_up_to]).unwrap_or_default());

                    match e.error_len() {
                        Some(invalid_len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.replacements += 1;
                            self.pending.advance(valid_up_to + invalid_len);
                        }
                        None => {
                            // Truncated sequence: wait for the rest of the codepoint
                            self.pending.advance(valid_up_to);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Try to decode next frame
    ///
    /// # Returns
    /// - `Some(frame)` - A terminated frame
    /// - `None` - No complete frame buffered yet
    pub fn decode(&mut self) -> Option<Frame> {
        if self.state == DecoderState::Stopped {
            return None;
        }

        let end = self.text.find(FRAME_DELIMITER)?;
        let rest = self.text.split_off(end + FRAME_DELIMITER.len());
        let mut block = std::mem::replace(&mut self.text, rest);
        block.truncate(end);

        self.frames_decoded += 1;
        Some(Frame::new(block))
    }

    /// Create decode iterator
    pub fn decode_iter(&mut self) -> DecodeIter<'_> {
        DecodeIter { decoder: self }
    }

    /// Signal end of input
    ///
    /// Unterminated text is never emitted as a frame. Returns the number of
    /// bytes discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.text.len() + self.pending.len();
        if discarded > 0 {
            tracing::debug!("Stream ended with {} bytes of unterminated data", discarded);
        }
        self.text.clear();
        self.pending.clear();
        discarded
    }

    /// Get number of decoded frames
    pub fn frames_decoded(&self) -> usize {
        self.frames_decoded
    }

    /// Get number of invalid sequences replaced
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Get number of pending bytes in buffer
    pub fn buffer_len(&self) -> usize {
        self.text.len() + self.pending.len()
    }
}

/// Decode iterator
pub struct DecodeIter<'a> {
    decoder: &'a mut StreamDecoder,
}

impl<'a> Iterator for DecodeIter<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.decode()
    }
}

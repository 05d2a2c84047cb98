//! Server-Sent Events stream parser
//!
//! Provides decoding of the chat streaming endpoint's SSE body into
//! payload strings

pub mod decoder;
pub mod error;
pub mod frame;
pub mod stream;

pub use decoder::StreamDecoder;
pub use stream::PayloadStream;

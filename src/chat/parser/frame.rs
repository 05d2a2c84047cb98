//! SSE frame definitions
//!
//! ## Wire Format
//!
//! ```text
//! data: {"type":"token","content":"Hel"}\n
//! \n                                   <- blank line closes the frame
//! : keepalive\n
//! \n                                   <- frame without payload lines
//! ```
//!
//! Only lines starting with `data:` carry payloads. The payload is the rest
//! of the line, trimmed. Every other line (comments, `event:`, `id:`) is ignored.

/// Frame delimiter
pub const FRAME_DELIMITER: &str = "\n\n";

/// Payload line prefix
pub const DATA_PREFIX: &str = "data:";

/// Decoded text block, delimiter excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String,
}

impl Frame {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Non-empty payloads of the frame's `data:` lines, in order
    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.text
            .lines()
            .filter_map(|line| line.strip_prefix(DATA_PREFIX))
            .map(str::trim)
            .filter(|payload| !payload.is_empty())
    }

    /// Whether the frame carries no payload (keepalive/comment frame)
    pub fn is_keepalive(&self) -> bool {
        self.payloads().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_payload() {
        let frame = Frame::new(r#"data: {"type":"token","content":"hi"}"#);
        let payloads: Vec<_> = frame.payloads().collect();
        assert_eq!(payloads, vec![r#"{"type":"token","content":"hi"}"#]);
    }

    #[test]
    fn test_prefix_without_space() {
        let frame = Frame::new("data:{\"a\":1}");
        assert_eq!(frame.payloads().collect::<Vec<_>>(), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_multiple_payload_lines() {
        let frame = Frame::new("event: message\ndata: one\nid: 7\ndata:  two  ");
        assert_eq!(frame.payloads().collect::<Vec<_>>(), vec!["one", "two"]);
    }

    #[test]
    fn test_empty_payload_lines_ignored() {
        let frame = Frame::new("data:\ndata:   \ndata: x");
        assert_eq!(frame.payloads().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_keepalive_frame() {
        let frame = Frame::new(": ping");
        assert!(frame.is_keepalive());
        assert_eq!(frame.payloads().count(), 0);
    }

    #[test]
    fn test_crlf_lines() {
        let frame = Frame::new("data: a\r\ndata: b\r");
        assert_eq!(frame.payloads().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

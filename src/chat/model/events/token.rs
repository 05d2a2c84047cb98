//! Token event
//!
//! Handles `token` type events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::base::EventPayload;

/// Assistant text fragment
///
/// Fields beyond `content` are captured in `extra` so that backend additions
/// never break deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEvent {
    /// Text fragment, appended verbatim
    pub content: String,

    #[serde(flatten)]
    #[serde(skip_serializing)]
    extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
impl TokenEvent {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }
}

impl EventPayload for TokenEvent {
    fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl std::fmt::Display for TokenEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_extra_fields() {
        let json = r#"{"type":"token","content":" world","index":4}"#;
        let event: TokenEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.content, " world");
    }

    #[test]
    fn test_missing_content_rejected() {
        assert!(serde_json::from_str::<TokenEvent>(r#"{"type":"token"}"#).is_err());
    }

    #[test]
    fn test_serialize_skips_extra() {
        let json = serde_json::to_string(&TokenEvent::new("Hi")).unwrap();
        assert_eq!(json, r#"{"content":"Hi"}"#);
    }
}

//! Final event
//!
//! Handles `final` type events, the authoritative end-of-turn state. The
//! non-streaming endpoint is normalized into the same shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::base::EventPayload;

/// Tool call as reported in a `final` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub output: Option<Value>,
}

/// End-of-turn state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinalEvent {
    /// Authoritative assistant text; replaces token accumulation when non-empty
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool_calls: Vec<FinalToolCall>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub response_id: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<FinalToolCall>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<FinalToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}

impl EventPayload for FinalEvent {
    fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl FinalEvent {
    /// Non-empty final content, if any
    pub fn authoritative_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

impl std::fmt::Display for FinalEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Final (content={} chars, tool_calls={}, response_id={})",
            self.content.as_deref().map(|c| c.chars().count()).unwrap_or(0),
            self.tool_calls.len(),
            self.response_id.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let event: FinalEvent = serde_json::from_str(r#"{"type":"final"}"#).unwrap();
        assert_eq!(event, FinalEvent::default());
        assert!(event.authoritative_content().is_none());
    }

    #[test]
    fn test_deserialize_full() {
        let json = r#"{
            "type": "final",
            "content": "Final text",
            "tool_calls": [
                {"id": "A", "name": "search", "input": {"q": "x"}, "output": {"n": 3}},
                {"id": "B", "name": "fetch"}
            ],
            "conversation_id": "default",
            "response_id": "resp-1"
        }"#;
        let event: FinalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.authoritative_content(), Some("Final text"));
        assert_eq!(event.tool_calls.len(), 2);
        assert_eq!(event.tool_calls[0].output, Some(json!({"n": 3})));
        assert!(event.tool_calls[1].input.is_none());
        assert_eq!(event.conversation_id.as_deref(), Some("default"));
    }

    #[test]
    fn test_null_tool_calls_is_empty() {
        let event: FinalEvent =
            serde_json::from_str(r#"{"content":"x","tool_calls":null}"#).unwrap();
        assert!(event.tool_calls.is_empty());
    }

    #[test]
    fn test_empty_content_not_authoritative() {
        let event: FinalEvent = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert!(event.authoritative_content().is_none());
    }
}

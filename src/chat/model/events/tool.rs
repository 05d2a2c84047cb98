//! Tool events
//!
//! Handles `tool_start` and `tool_end` type events

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::base::EventPayload;

/// A tool invocation has started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolStartEvent {
    /// Tool call ID, unique within a turn
    pub id: String,
    /// Tool name
    pub name: String,
    /// Input arguments
    #[serde(default)]
    pub input: Option<Value>,
}

/// A tool invocation has finished
///
/// May arrive without a preceding `tool_start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEndEvent {
    /// Tool call ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool result
    #[serde(default)]
    pub output: Option<Value>,
}

#[cfg(test)]
impl ToolStartEvent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Option<Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

#[cfg(test)]
impl ToolEndEvent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, output: Option<Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            output,
        }
    }
}

impl EventPayload for ToolStartEvent {
    fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl EventPayload for ToolEndEvent {
    fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl std::fmt::Display for ToolStartEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ToolStart[{}] (id={})", self.name, self.id)
    }
}

impl std::fmt::Display for ToolEndEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ToolEnd[{}] (id={})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_start_without_input() {
        let event: ToolStartEvent =
            serde_json::from_str(r#"{"type":"tool_start","id":"A","name":"search"}"#).unwrap();
        assert_eq!(event, ToolStartEvent::new("A", "search", None));
    }

    #[test]
    fn test_tool_end_with_output() {
        let event: ToolEndEvent = serde_json::from_str(
            r#"{"type":"tool_end","id":"B","name":"fetch","output":{"ok":true}}"#,
        )
        .unwrap();
        assert_eq!(event.output, Some(json!({"ok": true})));
    }

    #[test]
    fn test_tool_end_null_output_is_none() {
        let event: ToolEndEvent =
            serde_json::from_str(r#"{"id":"B","name":"fetch","output":null}"#).unwrap();
        assert!(event.output.is_none());
    }

    #[test]
    fn test_display() {
        let event = ToolEndEvent::new("B", "fetch", None);
        assert_eq!(event.to_string(), "ToolEnd[fetch] (id=B)");
    }
}

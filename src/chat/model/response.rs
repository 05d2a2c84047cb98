//! Non-streaming response normalization
//!
//! The non-streaming chat endpoint returns one JSON value in one of several
//! shapes. Each field is extracted by an ordered list of named rules; the
//! first rule that yields a value of the right kind wins.

use serde_json::Value;

use super::events::{FinalEvent, FinalToolCall};

/// Extraction rule: (name, JSON pointer)
type Rule = (&'static str, &'static str);

const CONTENT_RULES: &[Rule] = &[
    ("message.content", "/message/content"),
    ("message.message", "/message/message"),
    ("message", "/message"),
    ("content", "/content"),
    ("answer", "/answer"),
];

const TOOL_CALLS_RULES: &[Rule] = &[
    ("message.tool_calls", "/message/tool_calls"),
    ("tool_calls", "/tool_calls"),
];

const STEPS_RULES: &[Rule] = &[("message.steps", "/message/steps"), ("steps", "/steps")];

const RESPONSE_ID_RULES: &[Rule] = &[
    ("message.response_id", "/message/response_id"),
    ("response_id", "/response_id"),
];

const CONVERSATION_ID_RULES: &[Rule] = &[
    ("message.conversation_id", "/message/conversation_id"),
    ("conversation_id", "/conversation_id"),
];

/// Response of the non-streaming endpoint in canonical form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<FinalToolCall>,
    /// Intermediate reasoning steps, kept opaque
    pub steps: Vec<Value>,
    pub response_id: Option<String>,
    pub conversation_id: Option<String>,
}

fn first_str(value: &Value, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|(name, pointer)| {
        let found = value.pointer(pointer)?.as_str()?;
        tracing::trace!("Matched rule {}", name);
        Some(found.to_string())
    })
}

fn first_array<'a>(value: &'a Value, rules: &[Rule]) -> Option<&'a Vec<Value>> {
    rules.iter().find_map(|(name, pointer)| {
        let found = value.pointer(pointer)?.as_array()?;
        tracing::trace!("Matched rule {}", name);
        Some(found)
    })
}

impl NormalizedResponse {
    /// Normalize a loosely-typed response body
    ///
    /// Never fails: unrecognized shapes normalize to an empty response.
    pub fn from_value(value: &Value) -> Self {
        match value {
            // Plain string return from the backend
            Value::String(content) => Self {
                content: Some(content.clone()),
                ..Self::default()
            },
            Value::Object(_) => {
                let tool_calls = first_array(value, TOOL_CALLS_RULES)
                    .map(|calls| {
                        calls
                            .iter()
                            .filter_map(|call| {
                                match serde_json::from_value::<FinalToolCall>(call.clone()) {
                                    Ok(call) => Some(call),
                                    Err(e) => {
                                        tracing::debug!("Dropping malformed tool call ({}): {}", e, call);
                                        None
                                    }
                                }
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                let steps = first_array(value, STEPS_RULES).cloned().unwrap_or_default();
                if !steps.is_empty() {
                    tracing::debug!(steps = steps.len(), "Response carries reasoning steps");
                }

                Self {
                    content: first_str(value, CONTENT_RULES),
                    tool_calls,
                    steps,
                    response_id: first_str(value, RESPONSE_ID_RULES),
                    conversation_id: first_str(value, CONVERSATION_ID_RULES),
                }
            }
            other => {
                tracing::debug!("Unrecognized response shape: {}", other);
                Self::default()
            }
        }
    }

    /// Convert into the equivalent `final` event
    pub fn into_final_event(self) -> FinalEvent {
        FinalEvent {
            content: self.content,
            tool_calls: self.tool_calls,
            conversation_id: self.conversation_id,
            response_id: self.response_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_string() {
        let normalized = NormalizedResponse::from_value(&json!("Hello there"));
        assert_eq!(normalized.content.as_deref(), Some("Hello there"));
        assert!(normalized.tool_calls.is_empty());
    }

    #[test]
    fn test_message_string() {
        let normalized =
            NormalizedResponse::from_value(&json!({"message": "Hi", "conversation_id": "c1"}));
        assert_eq!(normalized.content.as_deref(), Some("Hi"));
        assert_eq!(normalized.conversation_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_nested_message_object() {
        let normalized = NormalizedResponse::from_value(&json!({
            "message": {
                "content": "Nested",
                "tool_calls": [{"id": "A", "name": "search", "input": {"q": "x"}, "output": {"n": 3}}],
                "steps": [{"thought": "look it up"}],
                "response_id": "r-nested"
            },
            "content": "Top level",
            "response_id": "r-top"
        }));
        assert_eq!(normalized.content.as_deref(), Some("Nested"));
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.tool_calls[0].output, Some(json!({"n": 3})));
        assert_eq!(normalized.steps.len(), 1);
        assert_eq!(normalized.response_id.as_deref(), Some("r-nested"));
    }

    #[test]
    fn test_nested_message_message() {
        let normalized =
            NormalizedResponse::from_value(&json!({"message": {"message": "Inner"}}));
        assert_eq!(normalized.content.as_deref(), Some("Inner"));
    }

    #[test]
    fn test_nested_without_text_falls_back_to_top_level() {
        let normalized = NormalizedResponse::from_value(&json!({
            "message": {"tool_calls": [{"id": "B", "name": "fetch"}]},
            "content": "Flat",
            "tool_calls": [{"id": "C", "name": "ignored"}]
        }));
        assert_eq!(normalized.content.as_deref(), Some("Flat"));
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.tool_calls[0].id, "B");
    }

    #[test]
    fn test_flat_shape_and_answer_fallback() {
        let flat = NormalizedResponse::from_value(&json!({"content": "Flat", "tool_calls": null}));
        assert_eq!(flat.content.as_deref(), Some("Flat"));
        assert!(flat.tool_calls.is_empty());

        let answer = NormalizedResponse::from_value(&json!({"answer": "42"}));
        assert_eq!(answer.content.as_deref(), Some("42"));
    }

    #[test]
    fn test_malformed_tool_call_dropped() {
        let normalized = NormalizedResponse::from_value(&json!({
            "content": "x",
            "tool_calls": [{"name": "no id"}, {"id": "A", "name": "ok"}]
        }));
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.tool_calls[0].id, "A");
    }

    #[test]
    fn test_unrecognized_shape_is_empty() {
        assert_eq!(NormalizedResponse::from_value(&json!(null)), NormalizedResponse::default());
        assert_eq!(NormalizedResponse::from_value(&json!([1, 2])), NormalizedResponse::default());
        assert!(NormalizedResponse::from_value(&json!({"content": 5})).content.is_none());
    }

    #[test]
    fn test_into_final_event() {
        let event = NormalizedResponse::from_value(&json!({"content": "Done", "response_id": "r1"}))
            .into_final_event();
        assert_eq!(event.authoritative_content(), Some("Done"));
        assert_eq!(event.response_id.as_deref(), Some("r1"));
    }
}

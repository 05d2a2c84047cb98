//! Conversation history
//!
//! In-memory message list owned by the UI layer; the orchestrator only reads
//! it to extract the prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single content part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    Text { text: String },
    ToolCall {
        id: String,
        name: String,
        args: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    pub fn assistant(parts: Vec<MessagePart>) -> Self {
        Self {
            role: Role::Assistant,
            parts,
        }
    }

    /// Concatenation of all text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Prompt for the next turn: text of the last user message, trimmed
///
/// Returns an empty string when there is no user message.
pub fn extract_prompt(history: &[ConversationMessage]) -> String {
    history
        .iter()
        .rev()
        .find(|message| message.role == Role::User)
        .map(|message| message.text().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_last_user_message() {
        let history = vec![
            ConversationMessage::user("first"),
            ConversationMessage::assistant(vec![MessagePart::Text {
                text: "reply".to_string(),
            }]),
            ConversationMessage::user("  second  "),
        ];
        assert_eq!(extract_prompt(&history), "second");
    }

    #[test]
    fn test_extract_concatenates_text_parts() {
        let message = ConversationMessage {
            role: Role::User,
            parts: vec![
                MessagePart::Text { text: " Hello".to_string() },
                MessagePart::ToolCall {
                    id: "A".to_string(),
                    name: "search".to_string(),
                    args: json!({}),
                    result: None,
                },
                MessagePart::Text { text: " world ".to_string() },
            ],
        };
        assert_eq!(extract_prompt(&[message]), "Hello world");
    }

    #[test]
    fn test_extract_skips_trailing_assistant() {
        let history = vec![
            ConversationMessage::user("question"),
            ConversationMessage::assistant(vec![]),
        ];
        assert_eq!(extract_prompt(&history), "question");
    }

    #[test]
    fn test_extract_empty_history() {
        assert_eq!(extract_prompt(&[]), "");
        assert_eq!(extract_prompt(&[ConversationMessage::user("   ")]), "");
    }

    #[test]
    fn test_part_serialization() {
        let part = MessagePart::Text { text: "hi".to_string() };
        assert_eq!(serde_json::to_value(&part).unwrap(), json!({"type": "text", "text": "hi"}));
    }
}

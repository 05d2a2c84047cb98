//! Chat request body

use serde::{Deserialize, Serialize};

/// Body of a chat turn request, shared by the streaming and non-streaming
/// endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Extracted user prompt
    pub content: String,
    /// Conversation the turn belongs to
    pub conversation_id: String,
}

impl ChatRequest {
    pub fn new(content: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

//! Event base definitions
//!
//! Defines event type enum, trait, and unified event structure

use serde_json::Value;

/// Event type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Assistant text fragment
    Token,
    /// Tool invocation started
    ToolStart,
    /// Tool invocation finished
    ToolEnd,
    /// Authoritative end-of-turn state
    Final,
    /// Unknown event type
    Unknown,
}

impl EventType {
    /// Parse from `type` discriminator
    pub fn from_str(s: &str) -> Self {
        match s {
            "token" => Self::Token,
            "tool_start" => Self::ToolStart,
            "tool_end" => Self::ToolEnd,
            "final" => Self::Final,
            _ => Self::Unknown,
        }
    }

    /// Convert to discriminator string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::ToolStart => "tool_start",
            Self::ToolEnd => "tool_end",
            Self::Final => "final",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event payload trait
///
/// All concrete event types must implement this trait
pub trait EventPayload: Sized {
    /// Parse event payload from the decoded JSON object
    fn from_value(value: Value) -> serde_json::Result<Self>;
}

/// Unified stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token(super::TokenEvent),
    ToolStart(super::ToolStartEvent),
    ToolEnd(super::ToolEndEvent),
    Final(super::FinalEvent),
}

impl StreamEvent {
    /// Parse a payload string into zero or one event
    ///
    /// Invalid JSON, non-object values, unknown or missing `type`, and
    /// shape mismatches are all dropped. Nothing here can fail a run.
    pub fn from_payload(payload: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Dropping non-JSON payload ({}): {}", e, payload);
                return None;
            }
        };

        let event_type = value
            .as_object()
            .and_then(|object| object.get("type"))
            .and_then(|t| t.as_str())
            .map(EventType::from_str)
            .unwrap_or(EventType::Unknown);

        let parsed = match event_type {
            EventType::Token => super::TokenEvent::from_value(value).map(Self::Token),
            EventType::ToolStart => super::ToolStartEvent::from_value(value).map(Self::ToolStart),
            EventType::ToolEnd => super::ToolEndEvent::from_value(value).map(Self::ToolEnd),
            EventType::Final => super::FinalEvent::from_value(value).map(Self::Final),
            EventType::Unknown => {
                tracing::debug!("Dropping payload without a recognized type: {}", payload);
                return None;
            }
        };

        match parsed {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!("Dropping malformed {} event: {}", event_type, e);
                None
            }
        }
    }

    /// Event type of this event
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Token(_) => EventType::Token,
            Self::ToolStart(_) => EventType::ToolStart,
            Self::ToolEnd(_) => EventType::ToolEnd,
            Self::Final(_) => EventType::Final,
        }
    }
}

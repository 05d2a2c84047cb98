//! Chat run error definitions
//!
//! Terminal failures of a chat turn, plus a user-facing summary of backend
//! error bodies.

use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;
use serde_json::Value;
use thiserror::Error;

use crate::chat::parser::error::DecodeError;

/// Terminal failure of a chat run
///
/// Cancellation is not a failure and has no variant here.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The response exposes no readable body
    #[error("Response has no readable body stream")]
    StreamUnavailable,
    /// The token provider returned no bearer token
    #[error("No access token available")]
    AuthUnavailable,
    /// Non-2xx response from the chat endpoint
    #[error("Chat request failed: {status} {body}")]
    ChatRequestFailed { status: StatusCode, body: String },
    /// Network failure while sending or reading
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Decoder buffer guard tripped
    #[error("Stream decode error: {0}")]
    Decode(#[from] DecodeError),
    /// A request header value could not be encoded
    #[error("Invalid request header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

impl ChatError {
    /// Message suitable for showing next to the last good snapshot
    pub fn user_message(&self) -> String {
        match self {
            Self::ChatRequestFailed { status, body } => match summarize_error_body(body) {
                Some(summary) => format!("Chat request failed ({}): {}", status.as_u16(), summary),
                None if body.trim().is_empty() => {
                    format!("Chat request failed ({})", status.as_u16())
                }
                None => format!("Chat request failed ({}): {}", status.as_u16(), body.trim()),
            },
            Self::AuthUnavailable => "Not signed in: no access token available.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Extract a short summary from an error response body
///
/// Priority: `detail` string, first `detail[].msg` (validation errors),
/// `error.message`, `error` string, `message`.
pub fn summarize_error_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;

    let summary = value
        .get("detail")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .pointer("/detail/0/msg")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| value.get("error").and_then(|v| v.as_str()).map(str::to_owned))
        .or_else(|| value.get("message").and_then(|v| v.as_str()).map(str::to_owned))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

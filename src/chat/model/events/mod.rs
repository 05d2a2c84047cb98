//! Event models
//!
//! Defines the event types carried by the chat stream's `data:` payloads

mod base;
mod final_event;
mod token;
mod tool;

pub use base::StreamEvent;
pub use final_event::{FinalEvent, FinalToolCall};
pub use token::TokenEvent;
pub use tool::{ToolEndEvent, ToolStartEvent};

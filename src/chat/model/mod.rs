//! Chat data models
//!
//! - `events`: Stream event types
//! - `requests`: Request body
//! - `response`: Non-streaming response normalization
//! - `credentials`: Credentials file

pub mod credentials;
pub mod events;
pub mod requests;
pub mod response;

//! Chat backend client module

pub mod assembler;
pub mod conversation;
pub mod errors;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod provider;
pub mod token_manager;

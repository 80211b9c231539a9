//! Minimal blocking client for OpenAI-compatible chat-completion APIs.

mod client;
mod error;

pub use client::{extract_json, ChatClient, ChatMessage};
pub use error::{LlmError, Result};

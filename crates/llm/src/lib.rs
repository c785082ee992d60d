//! LLM integration for the ISP support assistant.
//!
//! An OpenAI-compatible chat-completions client with retry, the
//! [`ReplyGenerator`] capability, and [`IspAgent`], which lets the model call
//! the ISP billing API through function calling.

mod agent;
pub mod ai_types;
mod client;
#[cfg(test)]
mod client_tests;
mod error;
mod generator;
pub mod prompt;

#[cfg(test)]
mod agent_tests;

pub use agent::{IspAgent, MAX_TOOL_ROUNDS};
pub use client::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, LlmClient, LlmConfig, truncate,
};
pub use error::LlmError;
pub use generator::{GeneratedReply, HistoryTurn, ReplyGenerator, ReplyRequest};

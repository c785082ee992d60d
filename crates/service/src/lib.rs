//! Service layer for isp-chat
//!
//! Centralizes business logic between HTTP/CLI handlers and storage/llm.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod chat_service;
mod error;
mod history_service;
#[cfg(test)]
mod test_support;

pub use chat_service::{ChatInput, ChatOutput, ChatService, ServiceConfig};
pub use error::ServiceError;
pub use history_service::{HistoryHealth, HistoryService, UserChatHistory};

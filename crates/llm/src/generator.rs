//! The reply-generation capability the chat pipeline depends on.

use async_trait::async_trait;
use isp_chat_core::Role;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One prior turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Everything a generator needs to answer one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
    /// Prior turns, oldest first.
    pub history: Vec<HistoryTurn>,
    pub user_id: Option<String>,
    pub language: String,
}

/// Raw model output plus what it took to produce it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReply {
    /// Unparsed model text; expected to follow the `{reply, metadata}` contract.
    pub raw_text: String,
    pub tools_used: Vec<String>,
    /// Calls made to the ISP API while answering.
    pub api_calls_made: u32,
}

/// Produces assistant replies. Implemented by [`crate::IspAgent`]; tests
/// substitute canned generators.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, LlmError>;
}

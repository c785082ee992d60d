//! End-to-end handling of one inbound chat message.

use std::sync::Arc;
use std::time::Instant;

use isp_chat_core::constants::{DEFAULT_HISTORY_DEPTH, DEFAULT_LANGUAGE, GENERATION_ERROR_REPLY};
use isp_chat_core::env_config::env_parse_with_default;
use isp_chat_core::{NewConversation, NewMessage, classify, estimate_tokens, parse_reply};
use isp_chat_llm::{HistoryTurn, ReplyGenerator, ReplyRequest};
use isp_chat_storage::StorageBackend;
use isp_chat_storage::traits::{ConversationStore, MessageStore};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

#[cfg(test)]
mod pipeline_tests;

/// Tunables for [`ChatService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Prior messages handed to the generator.
    pub history_depth: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { history_depth: DEFAULT_HISTORY_DEPTH }
    }
}

impl ServiceConfig {
    /// Reads `ISP_CHAT_HISTORY_DEPTH`.
    #[must_use]
    pub fn from_env() -> Self {
        Self { history_depth: env_parse_with_default("ISP_CHAT_HISTORY_DEPTH", DEFAULT_HISTORY_DEPTH) }
    }
}

/// One inbound chat message with its request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub language: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl ChatInput {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            conversation_id: None,
            user_id: None,
            language: DEFAULT_LANGUAGE.to_owned(),
            user_agent: None,
            ip_address: None,
        }
    }
}

/// Reply returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutput {
    pub response: String,
    pub conversation_id: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct ChatService {
    storage: Arc<StorageBackend>,
    generator: Arc<dyn ReplyGenerator>,
    config: ServiceConfig,
}

impl ChatService {
    #[must_use]
    pub fn new(
        storage: Arc<StorageBackend>,
        generator: Arc<dyn ReplyGenerator>,
        config: ServiceConfig,
    ) -> Self {
        Self { storage, generator, config }
    }

    /// Classify, persist, generate, parse and persist again.
    ///
    /// A failing generator yields a canned apology that is returned but not stored.
    pub async fn handle_message(&self, input: ChatInput) -> Result<ChatOutput, ServiceError> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(ServiceError::InvalidInput("message must not be empty".to_owned()));
        }
        let user_id = non_blank(input.user_id.as_deref()).map(str::to_owned);
        let language = non_blank(Some(&input.language))
            .map_or_else(|| DEFAULT_LANGUAGE.to_owned(), str::to_uppercase);

        let new_conversation = NewConversation::new(user_id.clone(), language.clone())
            .with_client(input.user_agent.clone(), input.ip_address.clone());
        let conversation = self
            .storage
            .get_or_create_conversation(non_blank(input.conversation_id.as_deref()), &new_conversation)
            .await?;

        let history: Vec<HistoryTurn> = self
            .storage
            .recent_messages(&conversation.id, self.config.history_depth)
            .await?
            .into_iter()
            .map(|m| HistoryTurn { role: m.role, content: m.content })
            .collect();

        let classification = classify(message);
        let user_message = self
            .storage
            .append_message(
                &NewMessage::user(&conversation.id, message)
                    .classified(classification.level, Some(classification.category.clone())),
            )
            .await?;
        tracing::debug!(
            conversation_id = %conversation.id,
            message_id = user_message.id,
            level = %classification.level,
            category = %classification.category,
            history = history.len(),
            "Stored user message"
        );

        let request = ReplyRequest {
            message: message.to_owned(),
            history,
            user_id,
            language,
        };
        let started = Instant::now();
        let generated = match self.generator.generate(&request).await {
            Ok(generated) => generated,
            Err(err) => {
                tracing::error!(conversation_id = %conversation.id, error = %err, "Reply generation failed");
                return Ok(ChatOutput {
                    response: GENERATION_ERROR_REPLY.to_owned(),
                    conversation_id: conversation.id,
                });
            },
        };
        let response_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = parse_reply(&generated.raw_text);
        if outcome.metadata.store {
            let assistant = NewMessage::new(&conversation.id, outcome.metadata.role(), &outcome.reply)
                .sender(outcome.metadata.sender.clone())
                .classified(classification.level, Some(classification.category))
                .tokens_used(estimate_tokens(&[message, outcome.reply.as_str()]))
                .response_time_ms(response_time_ms)
                .tools_used(generated.tools_used)
                .api_calls_made(generated.api_calls_made);
            let stored = self.storage.append_message(&assistant).await?;
            tracing::debug!(
                conversation_id = %conversation.id,
                message_id = stored.id,
                strategy = %outcome.strategy,
                response_time_ms,
                "Stored assistant reply"
            );
        } else {
            tracing::debug!(conversation_id = %conversation.id, "Reply marked store=false, not persisted");
        }

        Ok(ChatOutput { response: outcome.reply, conversation_id: conversation.id })
    }
}

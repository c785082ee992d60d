#![allow(clippy::unwrap_used, reason = "test code")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use isp_chat_core::constants::GENERATION_ERROR_REPLY;
use isp_chat_core::{MessageLevel, Role};
use isp_chat_llm::{GeneratedReply, LlmError, ReplyGenerator, ReplyRequest};
use isp_chat_storage::traits::{MessageStore, StatsStore};

use super::{ChatInput, ChatService, ServiceConfig};
use crate::ServiceError;
use crate::test_support::create_test_backend;

/// Returns a fixed reply and remembers every request it saw.
struct CannedGenerator {
    reply: GeneratedReply,
    seen: Mutex<Vec<ReplyRequest>>,
}

impl CannedGenerator {
    fn new(raw_text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: GeneratedReply { raw_text: raw_text.to_owned(), ..GeneratedReply::default() },
            seen: Mutex::new(Vec::new()),
        })
    }

    fn with_tools(raw_text: &str, tools: &[&str], api_calls_made: u32) -> Arc<Self> {
        Arc::new(Self {
            reply: GeneratedReply {
                raw_text: raw_text.to_owned(),
                tools_used: tools.iter().map(|t| (*t).to_owned()).collect(),
                api_calls_made,
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ReplyRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyGenerator for CannedGenerator {
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, LlmError> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl ReplyGenerator for FailingGenerator {
    async fn generate(&self, _request: &ReplyRequest) -> Result<GeneratedReply, LlmError> {
        Err(LlmError::EmptyResponse)
    }
}

fn user_input(message: &str, user_id: &str) -> ChatInput {
    ChatInput { user_id: Some(user_id.to_owned()), ..ChatInput::new(message) }
}

#[tokio::test]
async fn test_first_message_creates_conversation_and_stores_both_turns() {
    let (storage, _dir) = create_test_backend();
    let generator = CannedGenerator::with_tools(
        "```json\n{\"reply\": \"Let me check.\", \"metadata\": {\"store\": true}}\n```",
        &["check_internet_connectivity"],
        1,
    );
    let service = ChatService::new(Arc::clone(&storage), generator.clone(), ServiceConfig::default());

    let output = service.handle_message(user_input("my internet is not working", "10854")).await.unwrap();
    assert_eq!(output.response, "Let me check.");
    assert!(output.conversation_id.starts_with("user_10854_"));

    let messages = storage.recent_messages(&output.conversation_id, 10).await.unwrap();
    assert_eq!(messages.len(), 2);

    let user = &messages[0];
    assert_eq!(user.role, Role::User);
    assert_eq!(user.message_index, 1);
    assert_eq!(user.message_level, MessageLevel::High);
    assert_eq!(user.category.as_deref(), Some("technical"));

    let assistant = &messages[1];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.sender, "assistant");
    assert_eq!(assistant.message_index, 2);
    assert_eq!(assistant.message_level, MessageLevel::High);
    assert_eq!(assistant.tokens_used, 8);
    assert_eq!(assistant.tools_used, vec!["check_internet_connectivity".to_owned()]);
    assert_eq!(assistant.api_calls_made, 1);
    assert!(assistant.response_time_ms >= 0.0);

    let request = &generator.requests()[0];
    assert!(request.history.is_empty());
    assert_eq!(request.user_id.as_deref(), Some("10854"));
    assert_eq!(request.language, "EN");
}

#[tokio::test]
async fn test_follow_up_sees_prior_turns() {
    let (storage, _dir) = create_test_backend();
    let generator = CannedGenerator::new(r#"{"reply": "Sure."}"#);
    let service = ChatService::new(Arc::clone(&storage), generator.clone(), ServiceConfig::default());

    let first = service.handle_message(user_input("hello", "7")).await.unwrap();
    let second = service
        .handle_message(ChatInput {
            conversation_id: Some(first.conversation_id.clone()),
            ..user_input("show my packages", "7")
        })
        .await
        .unwrap();
    assert_eq!(second.conversation_id, first.conversation_id);

    let requests = generator.requests();
    let history = &requests[1].history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Sure.");
}

#[tokio::test]
async fn test_history_depth_limits_context() {
    let (storage, _dir) = create_test_backend();
    let generator = CannedGenerator::new("ok");
    let service = ChatService::new(
        Arc::clone(&storage),
        generator.clone(),
        ServiceConfig { history_depth: 2 },
    );

    let first = service.handle_message(user_input("one", "7")).await.unwrap();
    let follow_up = |text: &str| ChatInput {
        conversation_id: Some(first.conversation_id.clone()),
        ..user_input(text, "7")
    };
    service.handle_message(follow_up("two")).await.unwrap();
    service.handle_message(follow_up("three")).await.unwrap();

    let requests = generator.requests();
    let history = &requests[2].history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "two");
    assert_eq!(history[1].content, "ok");
}

#[tokio::test]
async fn test_store_false_skips_assistant_message() {
    let (storage, _dir) = create_test_backend();
    let generator = CannedGenerator::new(r#"{"reply": "Off the record.", "metadata": {"store": false}}"#);
    let service = ChatService::new(Arc::clone(&storage), generator, ServiceConfig::default());

    let output = service.handle_message(ChatInput::new("quick question")).await.unwrap();
    assert_eq!(output.response, "Off the record.");
    assert!(output.conversation_id.starts_with("anonymous_"));

    let messages = storage.recent_messages(&output.conversation_id, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
}

#[tokio::test]
async fn test_generator_failure_returns_apology_without_storing_it() {
    let (storage, _dir) = create_test_backend();
    let service = ChatService::new(Arc::clone(&storage), Arc::new(FailingGenerator), ServiceConfig::default());

    let output = service.handle_message(user_input("my bill is due", "7")).await.unwrap();
    assert_eq!(output.response, GENERATION_ERROR_REPLY);

    let messages = storage.recent_messages(&output.conversation_id, 10).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_level, MessageLevel::Critical);
    assert_eq!(messages[0].category.as_deref(), Some("billing"));
}

#[tokio::test]
async fn test_empty_message_is_rejected_before_storage() {
    let (storage, _dir) = create_test_backend();
    let service = ChatService::new(Arc::clone(&storage), CannedGenerator::new("hi"), ServiceConfig::default());

    let err = service.handle_message(ChatInput::new("   ")).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(storage.table_counts().await.unwrap().conversations, 0);
}

#[tokio::test]
async fn test_unknown_conversation_id_starts_new_conversation() {
    let (storage, _dir) = create_test_backend();
    let service = ChatService::new(Arc::clone(&storage), CannedGenerator::new("hi"), ServiceConfig::default());

    let output = service
        .handle_message(ChatInput {
            conversation_id: Some("user_7_19990101_000000_deadbeef".to_owned()),
            ..user_input("hello", "7")
        })
        .await
        .unwrap();
    assert_ne!(output.conversation_id, "user_7_19990101_000000_deadbeef");
    assert_eq!(storage.table_counts().await.unwrap().conversations, 1);
}

#[tokio::test]
async fn test_blank_user_id_is_anonymous_and_language_is_normalized() {
    let (storage, _dir) = create_test_backend();
    let generator = CannedGenerator::new("hi");
    let service = ChatService::new(Arc::clone(&storage), generator.clone(), ServiceConfig::default());

    let output = service
        .handle_message(ChatInput {
            user_id: Some("  ".to_owned()),
            language: "bn".to_owned(),
            ..ChatInput::new("hello")
        })
        .await
        .unwrap();
    assert!(output.conversation_id.starts_with("anonymous_"));
    let request = &generator.requests()[0];
    assert_eq!(request.user_id, None);
    assert_eq!(request.language, "BN");
}

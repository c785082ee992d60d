#![allow(clippy::unwrap_used, reason = "test code")]

use std::time::Duration;

use crate::ai_types::{ChatMessage, ChatRequest};
use crate::client::{LlmClient, LlmConfig, truncate};
use crate::error::LlmError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(server: &MockServer) -> LlmClient {
    LlmClient::new(LlmConfig::new("test-key", server.uri()).with_model("test-model"))
        .unwrap()
        .with_retry_delay(Duration::from_millis(1))
}

fn create_test_request() -> ChatRequest {
    ChatRequest {
        model: "test-model".to_owned(),
        messages: vec![ChatMessage::user("hello")],
        tools: Vec::new(),
        temperature: None,
        max_tokens: None,
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{
            "message": {"role": "assistant", "content": content, "tool_calls": null}
        }]
    })
}

#[tokio::test]
async fn test_success_on_first_attempt() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("test response")))
        .expect(1)
        .mount(&server)
        .await;

    let message = client.chat_completion(&create_test_request()).await.unwrap();
    assert_eq!(message.content.as_deref(), Some("test response"));
    assert!(message.tool_calls.is_empty());
}

#[tokio::test]
async fn test_retry_on_429_then_success() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Rate limit exceeded"))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("success after retry")))
        .expect(1)
        .mount(&server)
        .await;

    let message = client.chat_completion(&create_test_request()).await.unwrap();
    assert_eq!(message.content.as_deref(), Some("success after retry"));
}

#[tokio::test]
async fn test_retries_exhausted_on_persistent_503() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    let err = client.chat_completion(&create_test_request()).await.unwrap_err();
    match err {
        LlmError::RetriesExhausted(inner) => {
            assert!(matches!(*inner, LlmError::HttpStatus { code: 503, .. }));
        },
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.chat_completion(&create_test_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::HttpStatus { code: 401, .. }));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_empty_choices() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
        .mount(&server)
        .await;

    let err = client.chat_completion(&create_test_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn test_malformed_body() {
    let server = MockServer::start().await;
    let client = create_client(&server);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.chat_completion(&create_test_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::JsonParse { .. }));
}

#[test]
fn test_truncate_unicode_boundary() {
    let s = "привет";
    let result = truncate(s, 3);
    assert_eq!(result, "п");
    assert_eq!(truncate("hello", 10), "hello");
}

#[test]
fn test_config_debug_hides_key() {
    let config = LlmConfig::new("secret-key", "http://localhost");
    assert!(!format!("{config:?}").contains("secret-key"));
}

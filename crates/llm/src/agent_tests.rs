#![allow(clippy::unwrap_used, reason = "test code")]

use std::time::Duration;

use isp_chat_core::Role;
use isp_chat_isp::{IspClient, IspConfig};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{HistoryTurn, IspAgent, LlmClient, LlmConfig, LlmError, ReplyGenerator, ReplyRequest};

fn create_agent(llm: &MockServer, isp: &MockServer) -> IspAgent {
    let llm = LlmClient::new(LlmConfig::new("test-key", llm.uri()))
        .unwrap()
        .with_retry_delay(Duration::from_millis(1));
    let isp = IspClient::new(IspConfig::default().with_base_url(isp.uri())).unwrap();
    IspAgent::new(llm, isp)
}

fn request(message: &str) -> ReplyRequest {
    ReplyRequest {
        message: message.to_owned(),
        history: vec![
            HistoryTurn { role: Role::User, content: "hi".to_owned() },
            HistoryTurn { role: Role::Assistant, content: "Hello!".to_owned() },
        ],
        user_id: Some("10854".to_owned()),
        language: "EN".to_owned(),
    }
}

fn final_answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    }))
}

fn tool_call(name: &str, arguments: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": name, "arguments": arguments}
            }]
        }}]
    }))
}

#[tokio::test]
async fn test_direct_answer_without_tools() {
    let llm = MockServer::start().await;
    let isp = MockServer::start().await;
    let agent = create_agent(&llm, &isp);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("[CONTEXT: User ID is 10854."))
        .and(body_string_contains("\"content\":\"Hello!\""))
        .respond_with(final_answer(r#"{"reply": "Hello again", "metadata": {"store": true}}"#))
        .expect(1)
        .mount(&llm)
        .await;

    let reply = agent.generate(&request("thanks")).await.unwrap();
    assert!(reply.raw_text.contains("Hello again"));
    assert!(reply.tools_used.is_empty());
    assert_eq!(reply.api_calls_made, 0);
}

#[tokio::test]
async fn test_tool_round_trip() {
    let llm = MockServer::start().await;
    let isp = MockServer::start().await;
    let agent = create_agent(&llm, &isp);

    Mock::given(method("GET"))
        .and(path("/users/10854"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "details": {"id": 10854, "name": "Rahim", "subscription_status": "active", "status": "active", "conn_status": "conn"}
        })))
        .expect(1)
        .mount(&isp)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("\"role\":\"tool\""))
        .respond_with(final_answer(r#"{"reply": "Your connection looks fine."}"#))
        .with_priority(1)
        .expect(1)
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call("check_internet_connectivity", r#"{"user_id": "10854"}"#))
        .expect(1)
        .mount(&llm)
        .await;

    let reply = agent.generate(&request("is my internet ok?")).await.unwrap();
    assert!(reply.raw_text.contains("looks fine"));
    assert_eq!(reply.tools_used, vec!["check_internet_connectivity".to_owned()]);
    assert_eq!(reply.api_calls_made, 1);
}

#[tokio::test]
async fn test_unknown_tool_is_answered_with_error() {
    let llm = MockServer::start().await;
    let isp = MockServer::start().await;
    let agent = create_agent(&llm, &isp);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Unknown tool: format_disk"))
        .respond_with(final_answer("Sorry, I cannot do that."))
        .with_priority(1)
        .mount(&llm)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call("format_disk", "{}"))
        .mount(&llm)
        .await;

    let reply = agent.generate(&request("wipe it")).await.unwrap();
    assert_eq!(reply.raw_text, "Sorry, I cannot do that.");
    assert!(reply.tools_used.is_empty());
    assert_eq!(reply.api_calls_made, 0);
}

#[tokio::test]
async fn test_tool_loop_is_bounded() {
    let llm = MockServer::start().await;
    let isp = MockServer::start().await;
    let agent = create_agent(&llm, &isp).with_max_tool_rounds(2);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&isp)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call("search_user_by_id", r#"{"user_id": "1"}"#))
        .expect(3)
        .mount(&llm)
        .await;

    let err = agent.generate(&request("loop forever")).await.unwrap_err();
    assert!(matches!(err, LlmError::ToolLoopExhausted(2)));
}

#![allow(clippy::unwrap_used, reason = "test code")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use isp_chat_llm::{GeneratedReply, LlmError, ReplyGenerator, ReplyRequest};
use isp_chat_service::{ChatService, HistoryService, ServiceConfig};
use isp_chat_storage::StorageBackend;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{AppState, create_router};

struct EchoGenerator;

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, request: &ReplyRequest) -> Result<GeneratedReply, LlmError> {
        Ok(GeneratedReply {
            raw_text: json!({"reply": format!("You said: {}", request.message)}).to_string(),
            ..GeneratedReply::default()
        })
    }
}

fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(StorageBackend::new_sqlite(&dir.path().join("chat.db"), 4).unwrap());
    let state = Arc::new(AppState {
        chat_service: Arc::new(ChatService::new(
            Arc::clone(&storage),
            Arc::new(EchoGenerator),
            ServiceConfig::default(),
        )),
        history_service: Arc::new(HistoryService::new(storage)),
    });
    (create_router(state), dir)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn chat(app: &Router, message: &str, user_id: &str) -> String {
    let (status, body) =
        send(app, "POST", "/api/chat", Some(json!({"message": message, "user_id": user_id}))).await;
    assert_eq!(status, StatusCode::OK);
    body["conversation_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_chat_round_trip_and_history() {
    let (app, _dir) = test_app();

    let (status, body) =
        send(&app, "POST", "/api/chat", Some(json!({"message": "my bill", "user_id": "42"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "You said: my bill");
    let conversation_id = body["conversation_id"].as_str().unwrap().to_owned();

    let (status, body) =
        send(&app, "GET", &format!("/api/history/conversations/{conversation_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "42");
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["role"], "user");
    assert_eq!(body["items"][1]["role"], "assistant");

    let (status, body) = send(&app, "GET", "/api/chat/history/42?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_messages"], 2);
    assert_eq!(body["total_conversations"], 1);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, "POST", "/api/chat", Some(json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let (app, _dir) = test_app();
    let (status, _) = send(&app, "GET", "/api/history/conversations/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/api/history/conversations/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", "/api/history/messages/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_filters_are_bad_request() {
    let (app, _dir) = test_app();
    for uri in [
        "/api/history/conversations?session_type=robot",
        "/api/history/conversations?date_from=yesterday",
        "/api/history/conversations?limit=0",
        "/api/history/conversations?limit=1001",
        "/api/history/conversations?skip=18446744073709551615&limit=1",
        "/api/history/users/42/messages?skip=9223372036854775808",
        "/api/history/statistics/daily?days=91",
        "/api/history/search?q=a",
    ] {
        let (status, _) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_list_search_and_statistics() {
    let (app, _dir) = test_app();
    chat(&app, "router is blinking", "42").await;
    chat(&app, "hello", "43").await;

    let (status, body) = send(&app, "GET", "/api/history/conversations?user_id=42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);

    let (status, body) = send(&app, "GET", "/api/history/search?q=blinking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_term"], "blinking");
    assert_eq!(body["total"], 2);

    let (status, body) = send(&app, "GET", "/api/history/statistics/daily?user_id=43", None).await;
    assert_eq!(status, StatusCode::OK);
    let statistics = body["statistics"].as_array().unwrap();
    assert_eq!(statistics.len(), 1);
    assert_eq!(statistics[0]["total_messages"], 2);
}

#[tokio::test]
async fn test_delete_user_and_purge() {
    let (app, _dir) = test_app();
    chat(&app, "hello", "42").await;
    chat(&app, "hello again", "42").await;
    chat(&app, "hi", "7").await;

    let (status, body) = send(&app, "DELETE", "/api/history/users/42", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_conversations"], 2);
    assert_eq!(body["deleted_messages"], 4);

    let (status, _) = send(&app, "DELETE", "/api/history/purge", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", "/api/history/purge?confirm=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"]["conversations"], 1);
    assert_eq!(body["deleted"]["messages"], 2);

    let (status, body) = send(&app, "GET", "/api/history/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_messages"], 0);
}

#[tokio::test]
async fn test_delete_single_message() {
    let (app, _dir) = test_app();
    let conversation_id = chat(&app, "hello", "42").await;

    let (_, body) =
        send(&app, "GET", &format!("/api/history/conversations/{conversation_id}"), None).await;
    let message_id = body["items"][0]["id"].as_i64().unwrap();

    let (status, body) =
        send(&app, "DELETE", &format!("/api/history/messages/{message_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) =
        send(&app, "GET", &format!("/api/history/conversations/{conversation_id}"), None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_version_and_health() {
    let (app, _dir) = test_app();
    let (status, body) = send(&app, "GET", "/api/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

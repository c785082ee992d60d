//! HTTP API server for isp-chat.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(unreachable_pub, reason = "pub items are re-exported")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::missing_docs_in_private_items, reason = "Internal crate")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]
#![allow(clippy::exhaustive_structs, reason = "HTTP types are stable")]

pub mod api_error;
mod handlers;
mod query_types;
mod response_types;

#[cfg(test)]
mod router_tests;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use isp_chat_service::{ChatService, HistoryService};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::chat::ClientInfo;
pub use response_types::VersionResponse;

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Inbound chat pipeline
    pub chat_service: Arc<ChatService>,
    /// History queries, deletion and maintenance
    pub history_service: Arc<HistoryService>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/version", get(version))
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/chat/history/{user_id}", get(handlers::chat::chat_history))
        .route("/api/history/conversations", get(handlers::history::list_conversations))
        .route(
            "/api/history/conversations/{id}",
            get(handlers::history::conversation_messages)
                .delete(handlers::history::delete_conversation),
        )
        .route("/api/history/messages/{id}", delete(handlers::history::delete_message))
        .route(
            "/api/history/users/{user_id}/conversations",
            get(handlers::history::user_conversations),
        )
        .route("/api/history/users/{user_id}/messages", get(handlers::history::user_messages))
        .route("/api/history/users/{user_id}", delete(handlers::history::delete_user))
        .route("/api/history/purge", delete(handlers::history::purge))
        .route("/api/history/statistics/daily", get(handlers::history::daily_statistics))
        .route("/api/history/search", get(handlers::history::search))
        .route("/api/history/health", get(handlers::history::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, FromRequestParts, Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use isp_chat_service::{ChatInput, ChatOutput, UserChatHistory};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{ChatHistoryQuery, ChatRequest};

/// User agent and peer address of the caller, when known.
#[derive(Debug, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            user_agent: parts
                .headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            ip_address: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        })
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    client: ClientInfo,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatOutput>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_owned()));
    }
    tracing::debug!(user_id = ?req.user_id, conversation_id = ?req.conversation_id, "Chat request");
    let input = ChatInput {
        message: req.message,
        conversation_id: req.conversation_id,
        user_id: req.user_id,
        language: req.language,
        user_agent: client.user_agent,
        ip_address: client.ip_address,
    };
    let output = state.chat_service.handle_message(input).await?;
    Ok(Json(output))
}

pub async fn chat_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<UserChatHistory>, ApiError> {
    Ok(Json(state.history_service.chat_history(&user_id, query.limit).await?))
}

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use isp_chat_core::{Conversation, Page};
use isp_chat_service::HistoryHealth;
use isp_chat_storage::{ConversationMessages, UserMessages};

use crate::AppState;
use crate::api_error::ApiError;
use crate::query_types::{
    ConversationListQuery, ConversationMessagesQuery, PurgeQuery, SearchQuery, StatisticsQuery,
    UserConversationsQuery, UserMessagesQuery,
};
use crate::response_types::{
    DeleteResponse, DeleteUserResponse, PurgeResponse, SearchResponse, StatisticsResponse,
};

pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConversationListQuery>,
) -> Result<Json<Page<Conversation>>, ApiError> {
    let filter = query.filter()?;
    Ok(Json(state.history_service.list_conversations(&filter, query.skip, query.limit).await?))
}

pub async fn conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ConversationMessagesQuery>,
) -> Result<Json<ConversationMessages>, ApiError> {
    let filter = query.filter()?;
    let result =
        state.history_service.conversation_messages(&id, &filter, query.skip, query.limit).await?;
    Ok(Json(result))
}

pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !state.history_service.delete_conversation(&id).await? {
        return Err(ApiError::NotFound(format!("Conversation {id} not found")));
    }
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Conversation {id} deleted successfully"),
    }))
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !state.history_service.delete_message(id).await? {
        return Err(ApiError::NotFound(format!("Message {id} not found")));
    }
    Ok(Json(DeleteResponse { success: true, message: format!("Message {id} deleted successfully") }))
}

pub async fn user_conversations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserConversationsQuery>,
) -> Result<Json<Page<Conversation>>, ApiError> {
    Ok(Json(state.history_service.user_conversations(&user_id, query.skip, query.limit).await?))
}

pub async fn user_messages(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserMessagesQuery>,
) -> Result<Json<UserMessages>, ApiError> {
    Ok(Json(state.history_service.user_messages(&user_id, query.skip, query.limit).await?))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let deleted = state.history_service.delete_user(&user_id).await?;
    Ok(Json(DeleteUserResponse { success: true, user_id, deleted }))
}

pub async fn purge(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let deleted = state.history_service.purge_all(query.confirm).await?;
    Ok(Json(PurgeResponse { success: true, deleted }))
}

pub async fn daily_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let statistics =
        state.history_service.daily_statistics(query.date(), query.user_id(), query.days).await?;
    Ok(Json(StatisticsResponse { statistics }))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let page =
        state.history_service.search(&query.q, query.user_id(), query.skip, query.limit).await?;
    Ok(Json(SearchResponse { search_term: query.q.trim().to_owned(), page }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HistoryHealth>, ApiError> {
    Ok(Json(state.history_service.health().await?))
}

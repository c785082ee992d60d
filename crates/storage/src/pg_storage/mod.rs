//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by domain concern. Appends lock the owning
//! conversation row (`SELECT ... FOR UPDATE`) for index assignment, and fold
//! into the daily bucket with one `UPDATE` whose right-hand sides read the
//! pre-update row.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "DB row counts and pagination are bounded by PostgreSQL limits"
)]

mod conversations;
mod messages;
mod queries;
mod stats;

use chrono::{DateTime, Utc};
use isp_chat_core::constants::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS,
};
use isp_chat_core::{Conversation, DailyStatistics, LevelCounts, Message};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use super::pg_migrations::run_pg_migrations;
use crate::error::StorageError;

pub(crate) const CONVERSATION_COLUMNS: &str = "id, user_id, session_type, language, created_at, \
     updated_at, total_messages, total_tokens_used, user_agent, ip_address";

pub(crate) const MESSAGE_COLUMNS: &str = "m.id, m.conversation_id, m.role, m.sender, m.content, \
     m.message_index, m.message_level, m.category, m.tokens_used, m.response_time_ms, m.store, \
     m.contains_user_data, m.requires_follow_up, m.tools_used, m.api_calls_made, m.created_at";

pub(crate) const STATS_COLUMNS: &str = "date, user_id, total_conversations, total_messages, \
     user_messages, assistant_messages, total_tokens, low_level_count, mid_level_count, \
     high_level_count, critical_level_count, sensitive_level_count, total_api_calls, \
     avg_response_time_ms";

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

pub(crate) fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub(crate) fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, StorageError>
where
    T: std::str::FromStr<Err = isp_chat_core::CoreError>,
{
    Ok(row.try_get::<String, _>(column)?.parse()?)
}

pub(crate) fn row_to_conversation(row: &PgRow) -> Result<Conversation, StorageError> {
    Ok(Conversation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        session_type: parse_column(row, "session_type")?,
        language: row.try_get("language")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        total_messages: to_u64(row.try_get("total_messages")?),
        total_tokens_used: to_u64(row.try_get("total_tokens_used")?),
        user_agent: row.try_get("user_agent")?,
        ip_address: row.try_get("ip_address")?,
    })
}

pub(crate) fn row_to_message(row: &PgRow) -> Result<Message, StorageError> {
    let tools_used = match row.try_get::<Option<serde_json::Value>, _>("tools_used")? {
        Some(value) => serde_json::from_value(value)?,
        None => Vec::new(),
    };
    let message_index: i32 = row.try_get("message_index")?;
    let api_calls_made: i32 = row.try_get("api_calls_made")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: row.try_get("conversation_id")?,
        role: parse_column(row, "role")?,
        sender: row.try_get("sender")?,
        content: row.try_get("content")?,
        message_index: u32::try_from(message_index).unwrap_or(0),
        message_level: parse_column(row, "message_level")?,
        category: row.try_get("category")?,
        tokens_used: to_u64(row.try_get("tokens_used")?),
        response_time_ms: row.try_get("response_time_ms")?,
        store: row.try_get("store")?,
        contains_user_data: row.try_get("contains_user_data")?,
        requires_follow_up: row.try_get("requires_follow_up")?,
        tools_used,
        api_calls_made: u32::try_from(api_calls_made).unwrap_or(0),
        created_at,
    })
}

pub(crate) fn row_to_stats(row: &PgRow) -> Result<DailyStatistics, StorageError> {
    let counter = |column: &str| -> Result<u64, StorageError> {
        Ok(to_u64(row.try_get::<i64, _>(column)?))
    };
    Ok(DailyStatistics {
        date: row.try_get("date")?,
        user_id: row.try_get("user_id")?,
        total_conversations: counter("total_conversations")?,
        total_messages: counter("total_messages")?,
        user_messages: counter("user_messages")?,
        assistant_messages: counter("assistant_messages")?,
        total_tokens: counter("total_tokens")?,
        message_levels: LevelCounts {
            low: counter("low_level_count")?,
            mid: counter("mid_level_count")?,
            high: counter("high_level_count")?,
            critical: counter("critical_level_count")?,
            sensitive: counter("sensitive_level_count")?,
        },
        total_api_calls: counter("total_api_calls")?,
        avg_response_time_ms: row.try_get("avg_response_time_ms")?,
    })
}

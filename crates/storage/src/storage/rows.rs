//! Column lists and row mappers shared by the `SQLite` modules.

use chrono::{DateTime, Utc};
use isp_chat_core::{Conversation, DailyStatistics, LevelCounts, Message};
use rusqlite::Row;
use rusqlite::types::Type;

use super::to_u64;

pub(super) const CONVERSATION_COLUMNS: &str = "id, user_id, session_type, language, created_at, \
     updated_at, total_messages, total_tokens_used, user_agent, ip_address";

pub(super) const MESSAGE_COLUMNS: &str = "id, conversation_id, role, sender, content, \
     message_index, message_level, category, tokens_used, response_time_ms, store, \
     contains_user_data, requires_follow_up, tools_used, api_calls_made, created_at";

pub(super) const STATS_COLUMNS: &str = "id, date, user_id, total_conversations, total_messages, \
     user_messages, assistant_messages, total_tokens, low_level_count, mid_level_count, \
     high_level_count, critical_level_count, sensitive_level_count, total_api_calls, \
     avg_response_time_ms";

/// `MESSAGE_COLUMNS` qualified with the `m.` alias for joins.
pub(super) fn qualified_message_columns() -> String {
    MESSAGE_COLUMNS.split(", ").map(|c| format!("m.{}", c.trim())).collect::<Vec<_>>().join(", ")
}

fn conversion<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion(idx, e))
}

fn parse_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw).map(|d| d.with_timezone(&Utc)).map_err(|e| conversion(idx, e))
}

fn get_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    row.get::<_, i64>(idx).map(to_u64)
}

/// Map a row selected with [`CONVERSATION_COLUMNS`].
pub(super) fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session_type: parse_enum(row, 2)?,
        language: row.get(3)?,
        created_at: parse_ts(row, 4)?,
        updated_at: parse_ts(row, 5)?,
        total_messages: get_u64(row, 6)?,
        total_tokens_used: get_u64(row, 7)?,
        user_agent: row.get(8)?,
        ip_address: row.get(9)?,
    })
}

/// Map a row selected with [`MESSAGE_COLUMNS`] starting at `offset`.
pub(super) fn row_to_message_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Message> {
    let tools_used = match row.get::<_, Option<String>>(offset + 13)? {
        Some(json) => serde_json::from_str(&json).map_err(|e| conversion(offset + 13, e))?,
        None => Vec::new(),
    };
    Ok(Message {
        id: row.get(offset)?,
        conversation_id: row.get(offset + 1)?,
        role: parse_enum(row, offset + 2)?,
        sender: row.get(offset + 3)?,
        content: row.get(offset + 4)?,
        message_index: row.get(offset + 5)?,
        message_level: parse_enum(row, offset + 6)?,
        category: row.get(offset + 7)?,
        tokens_used: get_u64(row, offset + 8)?,
        response_time_ms: row.get(offset + 9)?,
        store: row.get(offset + 10)?,
        contains_user_data: row.get(offset + 11)?,
        requires_follow_up: row.get(offset + 12)?,
        tools_used,
        api_calls_made: row.get(offset + 14)?,
        created_at: parse_ts(row, offset + 15)?,
    })
}

pub(super) fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    row_to_message_at(row, 0)
}

/// Map a row selected with [`STATS_COLUMNS`] into `(row id, bucket)`.
pub(super) fn row_to_stats(row: &Row<'_>) -> rusqlite::Result<(i64, DailyStatistics)> {
    let stats = DailyStatistics {
        date: row.get(1)?,
        user_id: row.get(2)?,
        total_conversations: get_u64(row, 3)?,
        total_messages: get_u64(row, 4)?,
        user_messages: get_u64(row, 5)?,
        assistant_messages: get_u64(row, 6)?,
        total_tokens: get_u64(row, 7)?,
        message_levels: LevelCounts {
            low: get_u64(row, 8)?,
            mid: get_u64(row, 9)?,
            high: get_u64(row, 10)?,
            critical: get_u64(row, 11)?,
            sensitive: get_u64(row, 12)?,
        },
        total_api_calls: get_u64(row, 13)?,
        avg_response_time_ms: row.get(14)?,
    };
    Ok((row.get(0)?, stats))
}

/// JSON text for `tools_used`; NULL when the list is empty.
pub(super) fn tools_to_sql(tools: &[String]) -> Option<String> {
    if tools.is_empty() { None } else { serde_json::to_string(tools).ok() }
}

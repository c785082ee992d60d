use chrono::Utc;
use isp_chat_core::constants::is_anonymous_user;
use isp_chat_core::{DailyStatistics, window_start};
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Transaction, params, params_from_iter};

use super::rows::{STATS_COLUMNS, row_to_stats};
use super::{Storage, get_conn, to_i64, to_u64};
use crate::error::StorageError;
use crate::types::{DeleteUserResult, StatsQuery, TableCounts};

/// Load the `(date, user_id)` bucket inside `tx`, or an empty one if absent.
pub(super) fn load_bucket(
    tx: &Transaction<'_>,
    date: &str,
    user_id: Option<&str>,
) -> Result<(Option<i64>, DailyStatistics), StorageError> {
    let existing = tx
        .query_row(
            &format!(
                "SELECT {STATS_COLUMNS} FROM daily_statistics
                 WHERE date = ?1 AND COALESCE(user_id, '') = COALESCE(?2, '')"
            ),
            params![date, user_id],
            row_to_stats,
        )
        .optional()?;
    Ok(match existing {
        Some((id, stats)) => (Some(id), stats),
        None => (None, DailyStatistics::empty(date, user_id.map(str::to_owned))),
    })
}

/// Write a bucket produced by [`load_bucket`] back inside the same transaction.
pub(super) fn save_bucket(
    tx: &Transaction<'_>,
    row_id: Option<i64>,
    stats: &DailyStatistics,
) -> Result<(), StorageError> {
    let levels = &stats.message_levels;
    let counter = |n: u64| Value::Integer(to_i64(n));
    let mut fields = vec![
        Value::Text(stats.date.clone()),
        stats.user_id.clone().map_or(Value::Null, Value::Text),
        counter(stats.total_conversations),
        counter(stats.total_messages),
        counter(stats.user_messages),
        counter(stats.assistant_messages),
        counter(stats.total_tokens),
        counter(levels.low),
        counter(levels.mid),
        counter(levels.high),
        counter(levels.critical),
        counter(levels.sensitive),
        counter(stats.total_api_calls),
        Value::Real(stats.avg_response_time_ms),
    ];
    match row_id {
        Some(id) => {
            fields.push(Value::Integer(id));
            tx.execute(
                "UPDATE daily_statistics SET date = ?1, user_id = ?2, total_conversations = ?3,
                     total_messages = ?4, user_messages = ?5, assistant_messages = ?6,
                     total_tokens = ?7, low_level_count = ?8, mid_level_count = ?9,
                     high_level_count = ?10, critical_level_count = ?11,
                     sensitive_level_count = ?12, total_api_calls = ?13,
                     avg_response_time_ms = ?14
                 WHERE id = ?15",
                params_from_iter(fields),
            )?;
        },
        None => {
            tx.execute(
                "INSERT INTO daily_statistics (date, user_id, total_conversations, total_messages,
                     user_messages, assistant_messages, total_tokens, low_level_count,
                     mid_level_count, high_level_count, critical_level_count,
                     sensitive_level_count, total_api_calls, avg_response_time_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params_from_iter(fields),
            )?;
        },
    }
    Ok(())
}

/// `WHERE` fragments selecting a user's conversations and statistics buckets.
struct UserSelector {
    conversations: &'static str,
    statistics: &'static str,
    params: Vec<Value>,
}

impl UserSelector {
    fn new(user_id: &str) -> Self {
        if is_anonymous_user(user_id) {
            Self {
                conversations: "session_type = 'anonymous'",
                statistics: "user_id IS NULL",
                params: Vec::new(),
            }
        } else {
            Self {
                conversations: "user_id = ?1",
                statistics: "user_id = ?1",
                params: vec![Value::Text(user_id.to_owned())],
            }
        }
    }
}

impl Storage {
    /// Daily buckets for one date, or for the trailing window of `query.days`.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn daily_statistics(&self, query: &StatsQuery) -> Result<Vec<DailyStatistics>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut clauses = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match &query.date {
            Some(date) => {
                values.push(Value::Text(date.clone()));
                clauses.push(format!("date = ?{}", values.len()));
            },
            None => {
                values.push(Value::Text(window_start(Utc::now().date_naive(), query.days)));
                clauses.push(format!("date >= ?{}", values.len()));
            },
        }
        match query.user_id.as_deref() {
            Some(user) if is_anonymous_user(user) => clauses.push("user_id IS NULL".to_owned()),
            Some(user) => {
                values.push(Value::Text(user.to_owned()));
                clauses.push(format!("user_id = ?{}", values.len()));
            },
            None => {},
        }

        let sql = format!(
            "SELECT {STATS_COLUMNS} FROM daily_statistics WHERE {} ORDER BY date DESC, id",
            clauses.join(" AND ")
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_stats)?;
        rows.map(|r| r.map(|(_, stats)| stats).map_err(StorageError::from)).collect()
    }

    /// Row counts of every table.
    ///
    /// # Errors
    /// Returns error if a count query fails.
    pub fn table_counts(&self) -> Result<TableCounts, StorageError> {
        let conn = get_conn(&self.pool)?;
        let count = |table: &str| -> Result<u64, StorageError> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
            Ok(to_u64(n))
        };
        Ok(TableCounts {
            conversations: count("conversations")?,
            messages: count("messages")?,
            daily_statistics: count("daily_statistics")?,
        })
    }

    /// Delete every conversation of `user_id` and clear that user's buckets.
    ///
    /// `"anonymous"` (any case) selects anonymous sessions and the NULL-user bucket.
    ///
    /// # Errors
    /// Returns error if the transaction fails; nothing is deleted in that case.
    pub fn delete_user_data(&self, user_id: &str) -> Result<DeleteUserResult, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let selector = UserSelector::new(user_id);
        let messages: i64 = tx.query_row(
            &format!(
                "SELECT COUNT(*) FROM messages WHERE conversation_id IN
                     (SELECT id FROM conversations WHERE {})",
                selector.conversations
            ),
            params_from_iter(&selector.params),
            |row| row.get(0),
        )?;
        let deleted_messages = to_u64(messages);
        let deleted_conversations = tx.execute(
            &format!("DELETE FROM conversations WHERE {}", selector.conversations),
            params_from_iter(&selector.params),
        )?;
        let deleted_statistics = tx.execute(
            &format!("DELETE FROM daily_statistics WHERE {}", selector.statistics),
            params_from_iter(&selector.params),
        )?;
        tx.commit()?;

        tracing::info!(
            user_id,
            deleted_conversations,
            deleted_messages,
            deleted_statistics,
            "Deleted user chat history"
        );

        Ok(DeleteUserResult {
            deleted_conversations: deleted_conversations as u64,
            deleted_messages,
            deleted_statistics: deleted_statistics as u64,
        })
    }

    /// Delete every row of every table. Returns the pre-deletion counts.
    ///
    /// # Errors
    /// Returns error if the transaction fails.
    pub fn purge_all(&self) -> Result<TableCounts, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let messages = tx.execute("DELETE FROM messages", [])?;
        let conversations = tx.execute("DELETE FROM conversations", [])?;
        let daily_statistics = tx.execute("DELETE FROM daily_statistics", [])?;
        tx.commit()?;

        tracing::warn!(conversations, messages, daily_statistics, "Purged all chat history");

        Ok(TableCounts {
            conversations: conversations as u64,
            messages: messages as u64,
            daily_statistics: daily_statistics as u64,
        })
    }
}

//! StatsStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use isp_chat_core::constants::is_anonymous_user;
use isp_chat_core::{DailyStatistics, Message, MessageLevel, Role, window_start};
use sqlx::{Postgres, Transaction};

use super::{PgStorage, STATS_COLUMNS, row_to_stats, to_i64, to_u64};
use crate::error::StorageError;
use crate::traits::StatsStore;
use crate::types::{DeleteUserResult, StatsQuery, TableCounts};

const BUCKET_KEY: &str = "date = $1 AND COALESCE(user_id, '') = COALESCE($2::text, '')";

async fn ensure_bucket(
    tx: &mut Transaction<'_, Postgres>,
    date: &str,
    user_id: Option<&str>,
) -> Result<(), StorageError> {
    sqlx::query("INSERT INTO daily_statistics (date, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(date)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Count a new conversation in its bucket.
pub(super) async fn count_conversation(
    tx: &mut Transaction<'_, Postgres>,
    date: &str,
    user_id: Option<&str>,
) -> Result<(), StorageError> {
    ensure_bucket(tx, date, user_id).await?;
    sqlx::query(&format!(
        "UPDATE daily_statistics SET total_conversations = total_conversations + 1 WHERE {BUCKET_KEY}"
    ))
    .bind(date)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Fold one appended message into its bucket.
///
/// Every right-hand side reads the pre-update row, so the running average is
/// weighted by the assistant count before this message.
pub(super) async fn record_message(
    tx: &mut Transaction<'_, Postgres>,
    date: &str,
    user_id: Option<&str>,
    message: &Message,
) -> Result<(), StorageError> {
    ensure_bucket(tx, date, user_id).await?;
    let flag = |hit: bool| i64::from(hit);
    let level = message.message_level;
    let is_assistant = message.role == Role::Assistant;
    sqlx::query(&format!(
        "UPDATE daily_statistics SET
             total_messages = total_messages + 1,
             user_messages = user_messages + $3,
             assistant_messages = assistant_messages + $4,
             total_tokens = total_tokens + $5,
             low_level_count = low_level_count + $6,
             mid_level_count = mid_level_count + $7,
             high_level_count = high_level_count + $8,
             critical_level_count = critical_level_count + $9,
             sensitive_level_count = sensitive_level_count + $10,
             total_api_calls = total_api_calls + $11,
             avg_response_time_ms = CASE
                 WHEN $12 THEN (avg_response_time_ms * assistant_messages + $13) / (assistant_messages + 1)
                 ELSE avg_response_time_ms
             END
         WHERE {BUCKET_KEY}"
    ))
    .bind(date)
    .bind(user_id)
    .bind(flag(!is_assistant))
    .bind(flag(is_assistant))
    .bind(to_i64(message.tokens_used))
    .bind(flag(level == MessageLevel::Low))
    .bind(flag(level == MessageLevel::Mid))
    .bind(flag(level == MessageLevel::High))
    .bind(flag(level == MessageLevel::Critical))
    .bind(flag(level == MessageLevel::Sensitive))
    .bind(i64::from(message.api_calls_made))
    .bind(is_assistant && message.response_time_ms > 0.0)
    .bind(message.response_time_ms)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn count_rows(pool: &sqlx::PgPool, table: &str) -> Result<u64, StorageError> {
    let n: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(pool).await?;
    Ok(to_u64(n))
}

#[async_trait]
impl StatsStore for PgStorage {
    async fn daily_statistics(
        &self,
        query: &StatsQuery,
    ) -> Result<Vec<DailyStatistics>, StorageError> {
        let (date_clause, date_value) = match &query.date {
            Some(date) => ("date = $1", date.clone()),
            None => ("date >= $1", window_start(Utc::now().date_naive(), query.days)),
        };
        let anonymous = query.user_id.as_deref().is_some_and(is_anonymous_user);
        let user = if anonymous { None } else { query.user_id.as_deref() };
        let rows = sqlx::query(&format!(
            "SELECT {STATS_COLUMNS} FROM daily_statistics
             WHERE {date_clause}
               AND ($2::text IS NULL OR user_id = $2)
               AND (NOT $3 OR user_id IS NULL)
             ORDER BY date DESC, id"
        ))
        .bind(date_value)
        .bind(user)
        .bind(anonymous)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_stats).collect()
    }

    async fn table_counts(&self) -> Result<TableCounts, StorageError> {
        Ok(TableCounts {
            conversations: count_rows(&self.pool, "conversations").await?,
            messages: count_rows(&self.pool, "messages").await?,
            daily_statistics: count_rows(&self.pool, "daily_statistics").await?,
        })
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<DeleteUserResult, StorageError> {
        let anonymous = is_anonymous_user(user_id);
        let selector = "(($1 AND session_type = 'anonymous') OR (NOT $1 AND user_id = $2))";
        let mut tx = self.pool.begin().await?;

        let messages: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM messages WHERE conversation_id IN
                 (SELECT id FROM conversations WHERE {selector})"
        ))
        .bind(anonymous)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        let conversations = sqlx::query(&format!("DELETE FROM conversations WHERE {selector}"))
            .bind(anonymous)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let statistics = sqlx::query(
            "DELETE FROM daily_statistics
             WHERE ($1 AND user_id IS NULL) OR (NOT $1 AND user_id = $2)",
        )
        .bind(anonymous)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;

        tracing::info!(user_id, conversations, messages, statistics, "Deleted user chat history");
        Ok(DeleteUserResult {
            deleted_conversations: conversations,
            deleted_messages: to_u64(messages),
            deleted_statistics: statistics,
        })
    }

    async fn purge_all(&self) -> Result<TableCounts, StorageError> {
        let mut tx = self.pool.begin().await?;
        let messages = sqlx::query("DELETE FROM messages").execute(&mut *tx).await?.rows_affected();
        let conversations =
            sqlx::query("DELETE FROM conversations").execute(&mut *tx).await?.rows_affected();
        let daily_statistics =
            sqlx::query("DELETE FROM daily_statistics").execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        tracing::warn!(conversations, messages, daily_statistics, "Purged all chat history");
        Ok(TableCounts { conversations, messages, daily_statistics })
    }
}

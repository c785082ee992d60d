//! MessageStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use isp_chat_core::{Message, NewMessage, bucket_date, contains_user_data};

use super::{MESSAGE_COLUMNS, PgStorage, row_to_message, stats, to_i64};
use crate::error::StorageError;
use crate::traits::MessageStore;

#[async_trait]
impl MessageStore for PgStorage {
    async fn append_message(&self, input: &NewMessage) -> Result<Message, StorageError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(Option<String>, i32)> = sqlx::query_as(
            "SELECT user_id, last_message_index FROM conversations WHERE id = $1 FOR UPDATE",
        )
        .bind(&input.conversation_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((user_id, last_index)) = owner else {
            return Err(StorageError::NotFound {
                entity: "conversation",
                id: input.conversation_id.clone(),
            });
        };

        let current_max: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(message_index), 0) FROM messages WHERE conversation_id = $1",
        )
        .bind(&input.conversation_id)
        .fetch_one(&mut *tx)
        .await?;
        let message_index = last_index.max(current_max).saturating_add(1);

        let now = Utc::now();
        let mut message = Message {
            id: 0,
            conversation_id: input.conversation_id.clone(),
            role: input.role,
            sender: input.sender.clone(),
            content: input.content.clone(),
            message_index: u32::try_from(message_index).unwrap_or(1),
            message_level: input.message_level,
            category: input.category.clone(),
            tokens_used: input.tokens_used,
            response_time_ms: input.response_time_ms,
            store: input.store,
            contains_user_data: contains_user_data(&input.content),
            requires_follow_up: false,
            tools_used: input.tools_used.clone(),
            api_calls_made: input.api_calls_made,
            created_at: now,
        };
        let tools_used = (!message.tools_used.is_empty())
            .then(|| serde_json::to_value(&message.tools_used))
            .transpose()?;

        message.id = sqlx::query_scalar(
            "INSERT INTO messages (conversation_id, role, sender, content, message_index,
                 message_level, category, tokens_used, response_time_ms, store,
                 contains_user_data, requires_follow_up, tools_used, api_calls_made, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING id",
        )
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.sender)
        .bind(&message.content)
        .bind(message_index)
        .bind(message.message_level.as_str())
        .bind(&message.category)
        .bind(to_i64(message.tokens_used))
        .bind(message.response_time_ms)
        .bind(message.store)
        .bind(message.contains_user_data)
        .bind(message.requires_follow_up)
        .bind(tools_used)
        .bind(i32::try_from(message.api_calls_made).unwrap_or(i32::MAX))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations
             SET total_messages = total_messages + 1,
                 total_tokens_used = total_tokens_used + $2,
                 last_message_index = $4,
                 updated_at = $3
             WHERE id = $1",
        )
        .bind(&message.conversation_id)
        .bind(to_i64(message.tokens_used))
        .bind(now)
        .bind(message_index)
        .execute(&mut *tx)
        .await?;

        stats::record_message(&mut tx, &bucket_date(now), user_id.as_deref(), &message).await?;
        tx.commit().await?;

        tracing::debug!(
            conversation_id = %message.conversation_id,
            message_id = message.id,
            message_index = message.message_index,
            "Appended message"
        );
        Ok(message)
    }

    async fn get_message(&self, id: i64) -> Result<Option<Message>, StorageError> {
        let row = sqlx::query(&format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_message(&r)).transpose()
    }

    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m
             WHERE m.conversation_id = $1
             ORDER BY m.message_index DESC LIMIT $2"
        ))
        .bind(conversation_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        let mut messages = rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn delete_message(&self, id: i64) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;
        let deleted: Option<(String, i64)> = sqlx::query_as(
            "DELETE FROM messages WHERE id = $1 RETURNING conversation_id, tokens_used",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((conversation_id, tokens_used)) = deleted else {
            return Ok(false);
        };
        sqlx::query(
            "UPDATE conversations
             SET total_messages = GREATEST(total_messages - 1, 0),
                 total_tokens_used = GREATEST(total_tokens_used - $2, 0),
                 updated_at = $3
             WHERE id = $1",
        )
        .bind(&conversation_id)
        .bind(tokens_used)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}

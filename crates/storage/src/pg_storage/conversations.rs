//! ConversationStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::Utc;
use isp_chat_core::{Conversation, NewConversation, bucket_date};

use super::{CONVERSATION_COLUMNS, PgStorage, row_to_conversation, stats, to_i64};
use crate::error::StorageError;
use crate::traits::ConversationStore;

#[async_trait]
impl ConversationStore for PgStorage {
    async fn create_conversation(
        &self,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        let now = Utc::now();
        let conversation = Conversation::start(input, now);

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO conversations ({CONVERSATION_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(conversation.session_type.as_str())
        .bind(&conversation.language)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .bind(to_i64(conversation.total_messages))
        .bind(to_i64(conversation.total_tokens_used))
        .bind(&conversation.user_agent)
        .bind(&conversation.ip_address)
        .execute(&mut *tx)
        .await?;
        stats::count_conversation(&mut tx, &bucket_date(now), conversation.user_id.as_deref())
            .await?;
        tx.commit().await?;

        tracing::debug!(conversation_id = %conversation.id, "Created conversation");
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| row_to_conversation(&r)).transpose()
    }

    async fn get_or_create_conversation(
        &self,
        id: Option<&str>,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        if let Some(id) = id.filter(|s| !s.trim().is_empty()) {
            if let Some(existing) = self.get_conversation(id).await? {
                return Ok(existing);
            }
            tracing::debug!(conversation_id = id, "Unknown conversation id, starting a new one");
        }
        self.create_conversation(input).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

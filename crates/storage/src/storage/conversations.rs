use chrono::Utc;
use isp_chat_core::{Conversation, NewConversation, bucket_date};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use super::rows::{CONVERSATION_COLUMNS, row_to_conversation};
use super::stats::{load_bucket, save_bucket};
use super::{Storage, format_ts, get_conn, to_i64};
use crate::error::StorageError;

impl Storage {
    /// Create a conversation and count it in today's bucket for its user.
    ///
    /// # Errors
    /// Returns error if the insert fails.
    pub fn create_conversation(&self, input: &NewConversation) -> Result<Conversation, StorageError> {
        let now = Utc::now();
        let conversation = Conversation::start(input, now);

        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            &format!(
                "INSERT INTO conversations ({CONVERSATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                conversation.id,
                conversation.user_id,
                conversation.session_type.as_str(),
                conversation.language,
                format_ts(conversation.created_at),
                format_ts(conversation.updated_at),
                to_i64(conversation.total_messages),
                to_i64(conversation.total_tokens_used),
                conversation.user_agent,
                conversation.ip_address,
            ],
        )?;

        let (row_id, mut bucket) =
            load_bucket(&tx, &bucket_date(now), conversation.user_id.as_deref())?;
        bucket.total_conversations = bucket.total_conversations.saturating_add(1);
        save_bucket(&tx, row_id, &bucket)?;
        tx.commit()?;

        tracing::debug!(
            conversation_id = %conversation.id,
            session_type = %conversation.session_type,
            "Created conversation"
        );
        Ok(conversation)
    }

    /// Get conversation by ID.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let conversation = conn
            .query_row(
                &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
                row_to_conversation,
            )
            .optional()?;
        Ok(conversation)
    }

    /// Return the existing conversation `id`, or create a new one.
    ///
    /// # Errors
    /// Returns error if the lookup or the insert fails.
    pub fn get_or_create_conversation(
        &self,
        id: Option<&str>,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        if let Some(id) = id.filter(|s| !s.trim().is_empty()) {
            if let Some(existing) = self.get_conversation(id)? {
                return Ok(existing);
            }
            tracing::debug!(conversation_id = id, "Unknown conversation id, starting a new one");
        }
        self.create_conversation(input)
    }

    /// Delete a conversation; its messages go with it.
    ///
    /// # Errors
    /// Returns error if the delete fails.
    pub fn delete_conversation(&self, id: &str) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

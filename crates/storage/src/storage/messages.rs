use chrono::Utc;
use isp_chat_core::{Message, NewMessage, bucket_date, contains_user_data};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use super::rows::{MESSAGE_COLUMNS, row_to_message, tools_to_sql};
use super::stats::{load_bucket, save_bucket};
use super::{Storage, format_ts, get_conn, to_i64};
use crate::error::StorageError;

impl Storage {
    /// Append a message, bump its conversation's counters and fold it into the daily bucket.
    ///
    /// The new index is one past the larger of the current maximum and the
    /// conversation's high-water mark, so deleting the newest message never
    /// frees its index.
    ///
    /// # Errors
    /// Returns `NotFound` if the conversation does not exist, or a database
    /// error; in both cases nothing is written.
    pub fn append_message(&self, input: &NewMessage) -> Result<Message, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner: Option<(Option<String>, u32)> = tx
            .query_row(
                "SELECT c.user_id,
                        MAX(c.last_message_index,
                            (SELECT COALESCE(MAX(m.message_index), 0) FROM messages m
                             WHERE m.conversation_id = c.id)) + 1
                 FROM conversations c WHERE c.id = ?1",
                params![input.conversation_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((user_id, message_index)) = owner else {
            return Err(StorageError::NotFound {
                entity: "conversation",
                id: input.conversation_id.clone(),
            });
        };

        let now = Utc::now();
        let mut message = Message {
            id: 0,
            conversation_id: input.conversation_id.clone(),
            role: input.role,
            sender: input.sender.clone(),
            content: input.content.clone(),
            message_index,
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

        tx.execute(
            "INSERT INTO messages (conversation_id, role, sender, content, message_index,
                 message_level, category, tokens_used, response_time_ms, store,
                 contains_user_data, requires_follow_up, tools_used, api_calls_made, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                message.conversation_id,
                message.role.as_str(),
                message.sender,
                message.content,
                message.message_index,
                message.message_level.as_str(),
                message.category,
                to_i64(message.tokens_used),
                message.response_time_ms,
                message.store,
                message.contains_user_data,
                message.requires_follow_up,
                tools_to_sql(&message.tools_used),
                message.api_calls_made,
                format_ts(now),
            ],
        )?;
        message.id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE conversations
             SET total_messages = total_messages + 1,
                 total_tokens_used = total_tokens_used + ?2,
                 last_message_index = ?4,
                 updated_at = ?3
             WHERE id = ?1",
            params![
                message.conversation_id,
                to_i64(message.tokens_used),
                format_ts(now),
                message.message_index
            ],
        )?;

        let (row_id, mut bucket) = load_bucket(&tx, &bucket_date(now), user_id.as_deref())?;
        bucket.record_message(&message);
        save_bucket(&tx, row_id, &bucket)?;

        tx.commit()?;

        tracing::debug!(
            conversation_id = %message.conversation_id,
            message_id = message.id,
            message_index = message.message_index,
            role = %message.role,
            level = %message.message_level,
            "Appended message"
        );
        Ok(message)
    }

    /// Get message by ID.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn get_message(&self, id: i64) -> Result<Option<Message>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let message = conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// The last `limit` messages of a conversation in ascending `message_index` order.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE conversation_id = ?1
             ORDER BY message_index DESC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![conversation_id, limit as i64], row_to_message)?;
        let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Delete one message and decrement its conversation's counters, floored at zero.
    ///
    /// Daily statistics are left as they were.
    ///
    /// # Errors
    /// Returns error if the transaction fails.
    pub fn delete_message(&self, id: i64) -> Result<bool, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let target: Option<(String, i64)> = tx
            .query_row(
                "SELECT conversation_id, tokens_used FROM messages WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((conversation_id, tokens_used)) = target else {
            return Ok(false);
        };

        tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        tx.execute(
            "UPDATE conversations
             SET total_messages = MAX(total_messages - 1, 0),
                 total_tokens_used = MAX(total_tokens_used - ?2, 0),
                 updated_at = ?3
             WHERE id = ?1",
            params![conversation_id, tokens_used, format_ts(Utc::now())],
        )?;
        tx.commit()?;

        tracing::debug!(message_id = id, conversation_id = %conversation_id, "Deleted message");
        Ok(true)
    }
}

use async_trait::async_trait;
use isp_chat_core::{Message, NewMessage};

use crate::error::StorageError;

/// Message append and removal.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message to its conversation.
    ///
    /// Index assignment, the insert, the conversation counters and the daily
    /// statistics bucket are committed together or not at all. Fails with
    /// [`StorageError::NotFound`] when the conversation does not exist.
    async fn append_message(&self, input: &NewMessage) -> Result<Message, StorageError>;

    /// Get message by ID.
    async fn get_message(&self, id: i64) -> Result<Option<Message>, StorageError>;

    /// Last `limit` messages of a conversation, oldest first.
    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError>;

    /// Delete a message and decrement its conversation's counters.
    /// Returns `false` when no such message exists.
    async fn delete_message(&self, id: i64) -> Result<bool, StorageError>;
}

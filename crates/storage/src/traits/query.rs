use async_trait::async_trait;
use isp_chat_core::{Conversation, ConversationFilter, Message, MessageFilter, Page, PageRequest};

use crate::error::StorageError;
use crate::types::{ConversationMessages, UserMessages};

/// Read-side history queries.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Conversations matching every set filter, most recently updated first.
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>, StorageError>;

    /// Messages of one conversation in `message_index` order.
    ///
    /// [`StorageError::NotFound`] only when nothing matched and the
    /// conversation itself is unknown.
    async fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<ConversationMessages, StorageError>;

    /// Messages across all conversations of a user, oldest first.
    async fn user_messages(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<UserMessages, StorageError>;

    /// Substring search over message content, newest first.
    async fn search_messages(
        &self,
        term: &str,
        user_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Message>, StorageError>;
}

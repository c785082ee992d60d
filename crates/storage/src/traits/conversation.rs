use async_trait::async_trait;
use isp_chat_core::{Conversation, NewConversation};

use crate::error::StorageError;

/// Conversation lifecycle operations.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation with a fresh identifier.
    ///
    /// Also counts the conversation in today's statistics bucket for its user.
    async fn create_conversation(
        &self,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError>;

    /// Get conversation by ID.
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError>;

    /// Return the conversation `id` if it exists, otherwise create a new one from `input`.
    async fn get_or_create_conversation(
        &self,
        id: Option<&str>,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError>;

    /// Delete a conversation and its messages. Returns `true` if a row was deleted.
    async fn delete_conversation(&self, id: &str) -> Result<bool, StorageError>;
}

//! Unified storage backend with enum dispatch.

#[cfg(feature = "sqlite")]
use std::path::Path;

use async_trait::async_trait;
use isp_chat_core::{
    Conversation, ConversationFilter, DailyStatistics, Message, MessageFilter, NewConversation,
    NewMessage, Page, PageRequest,
};

use crate::error::StorageError;
use crate::traits::{ConversationStore, MessageStore, QueryStore, StatsStore};
use crate::types::{ConversationMessages, DeleteUserResult, StatsQuery, TableCounts, UserMessages};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::Storage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::pg_storage::PgStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::Storage),
    #[cfg(feature = "postgres")]
    Postgres(crate::pg_storage::PgStorage),
}

impl StorageBackend {
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(db_path: &Path, pool_size: u32) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::Storage::new(db_path, pool_size)?))
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(database_url: &str) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::pg_storage::PgStorage::new(database_url).await?))
    }

    /// Short backend name for logs and health output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => "postgres",
        }
    }
}

// ── ConversationStore ────────────────────────────────────────────

#[async_trait]
impl ConversationStore for StorageBackend {
    async fn create_conversation(
        &self,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        dispatch!(self, ConversationStore, create_conversation(input))
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        dispatch!(self, ConversationStore, get_conversation(id))
    }

    async fn get_or_create_conversation(
        &self,
        id: Option<&str>,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        dispatch!(self, ConversationStore, get_or_create_conversation(id, input))
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, StorageError> {
        dispatch!(self, ConversationStore, delete_conversation(id))
    }
}

// ── MessageStore ─────────────────────────────────────────────────

#[async_trait]
impl MessageStore for StorageBackend {
    async fn append_message(&self, input: &NewMessage) -> Result<Message, StorageError> {
        dispatch!(self, MessageStore, append_message(input))
    }

    async fn get_message(&self, id: i64) -> Result<Option<Message>, StorageError> {
        dispatch!(self, MessageStore, get_message(id))
    }

    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        dispatch!(self, MessageStore, recent_messages(conversation_id, limit))
    }

    async fn delete_message(&self, id: i64) -> Result<bool, StorageError> {
        dispatch!(self, MessageStore, delete_message(id))
    }
}

// ── StatsStore ───────────────────────────────────────────────────

#[async_trait]
impl StatsStore for StorageBackend {
    async fn daily_statistics(
        &self,
        query: &StatsQuery,
    ) -> Result<Vec<DailyStatistics>, StorageError> {
        dispatch!(self, StatsStore, daily_statistics(query))
    }

    async fn table_counts(&self) -> Result<TableCounts, StorageError> {
        dispatch!(self, StatsStore, table_counts())
    }

    async fn delete_user_data(&self, user_id: &str) -> Result<DeleteUserResult, StorageError> {
        dispatch!(self, StatsStore, delete_user_data(user_id))
    }

    async fn purge_all(&self) -> Result<TableCounts, StorageError> {
        dispatch!(self, StatsStore, purge_all())
    }
}

// ── QueryStore ───────────────────────────────────────────────────

#[async_trait]
impl QueryStore for StorageBackend {
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>, StorageError> {
        dispatch!(self, QueryStore, list_conversations(filter, page))
    }

    async fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<ConversationMessages, StorageError> {
        dispatch!(self, QueryStore, conversation_messages(conversation_id, filter, page))
    }

    async fn user_messages(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<UserMessages, StorageError> {
        dispatch!(self, QueryStore, user_messages(user_id, page))
    }

    async fn search_messages(
        &self,
        term: &str,
        user_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Message>, StorageError> {
        dispatch!(self, QueryStore, search_messages(term, user_id, page))
    }
}

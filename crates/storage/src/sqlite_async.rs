//! Async trait implementations for SQLite `Storage` via `spawn_blocking`.

use async_trait::async_trait;
use isp_chat_core::{
    Conversation, ConversationFilter, DailyStatistics, Message, MessageFilter, NewConversation,
    NewMessage, Page, PageRequest,
};

use crate::Storage;
use crate::error::StorageError;
use crate::traits::{ConversationStore, MessageStore, QueryStore, StatsStore};
use crate::types::{ConversationMessages, DeleteUserResult, StatsQuery, TableCounts, UserMessages};

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Blocking(format!("spawn_blocking join error: {e}")))?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Each argument is annotated with a capture kind:
/// - `@ref arg`: `.clone()` a `&T`, pass as `&arg`
/// - `@str arg`: `.to_owned()` a `&str`, pass as `&arg`
/// - `@opt_str arg`: `.map(ToOwned::to_owned)` an `Option<&str>`, pass as `arg.as_deref()`
/// - `@val arg`: move directly (Copy/owned types)
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture opt_str $arg:ident) => { let $arg = $arg.map(ToOwned::to_owned); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass opt_str $arg:ident) => { $arg.as_deref() };
    (@pass val $arg:ident) => { $arg };
}

// ── ConversationStore ────────────────────────────────────────────

#[async_trait]
impl ConversationStore for Storage {
    async fn create_conversation(
        &self,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        delegate!(self, create_conversation, @ref input)
    }
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        delegate!(self, get_conversation, @str id)
    }
    async fn get_or_create_conversation(
        &self,
        id: Option<&str>,
        input: &NewConversation,
    ) -> Result<Conversation, StorageError> {
        delegate!(self, get_or_create_conversation, @opt_str id, @ref input)
    }
    async fn delete_conversation(&self, id: &str) -> Result<bool, StorageError> {
        delegate!(self, delete_conversation, @str id)
    }
}

// ── MessageStore ─────────────────────────────────────────────────

#[async_trait]
impl MessageStore for Storage {
    async fn append_message(&self, input: &NewMessage) -> Result<Message, StorageError> {
        delegate!(self, append_message, @ref input)
    }
    async fn get_message(&self, id: i64) -> Result<Option<Message>, StorageError> {
        delegate!(self, get_message, @val id)
    }
    async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StorageError> {
        delegate!(self, recent_messages, @str conversation_id, @val limit)
    }
    async fn delete_message(&self, id: i64) -> Result<bool, StorageError> {
        delegate!(self, delete_message, @val id)
    }
}

// ── StatsStore ───────────────────────────────────────────────────

#[async_trait]
impl StatsStore for Storage {
    async fn daily_statistics(
        &self,
        query: &StatsQuery,
    ) -> Result<Vec<DailyStatistics>, StorageError> {
        delegate!(self, daily_statistics, @ref query)
    }
    async fn table_counts(&self) -> Result<TableCounts, StorageError> {
        delegate!(self, table_counts)
    }
    async fn delete_user_data(&self, user_id: &str) -> Result<DeleteUserResult, StorageError> {
        delegate!(self, delete_user_data, @str user_id)
    }
    async fn purge_all(&self) -> Result<TableCounts, StorageError> {
        delegate!(self, purge_all)
    }
}

// ── QueryStore ───────────────────────────────────────────────────

#[async_trait]
impl QueryStore for Storage {
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>, StorageError> {
        delegate!(self, list_conversations, @ref filter, @val page)
    }
    async fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<ConversationMessages, StorageError> {
        delegate!(self, conversation_messages, @str conversation_id, @ref filter, @val page)
    }
    async fn user_messages(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<UserMessages, StorageError> {
        delegate!(self, user_messages, @str user_id, @val page)
    }
    async fn search_messages(
        &self,
        term: &str,
        user_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Message>, StorageError> {
        delegate!(self, search_messages, @str term, @opt_str user_id, @val page)
    }
}

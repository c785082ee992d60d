//! Read, delete and maintenance operations over stored chat history.

use std::sync::Arc;

use isp_chat_core::constants::{
    MAX_CONVERSATION_LIMIT, MAX_MESSAGE_LIMIT, MAX_STATS_DAYS, MIN_SEARCH_TERM_LEN,
    is_anonymous_user,
};
use isp_chat_core::{
    Conversation, ConversationFilter, DailyStatistics, Message, MessageFilter, Page, PageRequest,
    SessionType, parse_bucket_date,
};
use isp_chat_storage::traits::{ConversationStore, MessageStore, QueryStore, StatsStore};
use isp_chat_storage::{
    ConversationMessages, DeleteUserResult, StatsQuery, StorageBackend, TableCounts, UserMessage,
    UserMessages,
};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Every message of one user across conversations, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserChatHistory {
    pub user_id: String,
    pub total_messages: usize,
    pub total_conversations: u64,
    pub messages: Vec<UserMessage>,
}

/// Liveness of the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryHealth {
    pub status: String,
    pub database: String,
    pub total_conversations: u64,
    pub total_messages: u64,
}

/// Validate a caller-supplied window; `limit` must lie in `1..=max`.
fn page(skip: usize, limit: usize, max: usize) -> Result<PageRequest, ServiceError> {
    if limit == 0 || limit > max {
        return Err(ServiceError::InvalidInput(format!("limit must be between 1 and {max}")));
    }
    if i64::try_from(skip).is_err() {
        return Err(ServiceError::InvalidInput(format!("skip must not exceed {}", i64::MAX)));
    }
    Ok(PageRequest::new(skip, limit, max))
}

pub struct HistoryService {
    storage: Arc<StorageBackend>,
}

impl HistoryService {
    #[must_use]
    pub const fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    pub async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Conversation>, ServiceError> {
        let request = page(skip, limit, MAX_CONVERSATION_LIMIT)?;
        Ok(self.storage.list_conversations(filter, request).await?)
    }

    /// Conversations of one user; `"anonymous"` lists every anonymous session.
    pub async fn user_conversations(
        &self,
        user_id: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Conversation>, ServiceError> {
        let filter = if is_anonymous_user(user_id) {
            ConversationFilter { session_type: Some(SessionType::Anonymous), ..ConversationFilter::default() }
        } else {
            ConversationFilter::for_user(user_id)
        };
        self.list_conversations(&filter, skip, limit).await
    }

    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        skip: usize,
        limit: usize,
    ) -> Result<ConversationMessages, ServiceError> {
        let request = page(skip, limit, MAX_MESSAGE_LIMIT)?;
        Ok(self.storage.conversation_messages(conversation_id, filter, request).await?)
    }

    pub async fn user_messages(
        &self,
        user_id: &str,
        skip: usize,
        limit: usize,
    ) -> Result<UserMessages, ServiceError> {
        let request = page(skip, limit, MAX_CONVERSATION_LIMIT)?;
        Ok(self.storage.user_messages(user_id, request).await?)
    }

    /// The first `limit` messages of a user in chronological order.
    pub async fn chat_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<UserChatHistory, ServiceError> {
        let result = self.user_messages(user_id, 0, limit).await?;
        Ok(UserChatHistory {
            user_id: result.user_id,
            total_messages: result.page.items.len(),
            total_conversations: result.conversations_count,
            messages: result.page.items,
        })
    }

    /// Substring search; the trimmed term needs at least two characters.
    pub async fn search(
        &self,
        term: &str,
        user_id: Option<&str>,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Message>, ServiceError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_TERM_LEN {
            return Err(ServiceError::InvalidInput(format!(
                "search term must be at least {MIN_SEARCH_TERM_LEN} characters"
            )));
        }
        let request = page(skip, limit, MAX_MESSAGE_LIMIT)?;
        Ok(self.storage.search_messages(term, user_id, request).await?)
    }

    pub async fn daily_statistics(
        &self,
        date: Option<&str>,
        user_id: Option<&str>,
        days: u32,
    ) -> Result<Vec<DailyStatistics>, ServiceError> {
        if days == 0 || days > MAX_STATS_DAYS {
            return Err(ServiceError::InvalidInput(format!(
                "days must be between 1 and {MAX_STATS_DAYS}"
            )));
        }
        let date = date.map(parse_bucket_date).transpose()?;
        let query = StatsQuery {
            date: date.map(|d| d.format(isp_chat_core::BUCKET_DATE_FORMAT).to_string()),
            user_id: user_id.map(str::to_owned),
            days,
        };
        Ok(self.storage.daily_statistics(&query).await?)
    }

    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<bool, ServiceError> {
        let deleted = self.storage.delete_conversation(conversation_id).await?;
        if deleted {
            tracing::info!(conversation_id, "Deleted conversation");
        }
        Ok(deleted)
    }

    pub async fn delete_message(&self, message_id: i64) -> Result<bool, ServiceError> {
        let deleted = self.storage.delete_message(message_id).await?;
        if deleted {
            tracing::info!(message_id, "Deleted message");
        }
        Ok(deleted)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<DeleteUserResult, ServiceError> {
        let result = self.storage.delete_user_data(user_id).await?;
        tracing::info!(
            user_id,
            conversations = result.deleted_conversations,
            messages = result.deleted_messages,
            statistics = result.deleted_statistics,
            "Deleted user history"
        );
        Ok(result)
    }

    /// Wipe every table. Refuses unless `confirm` is set.
    pub async fn purge_all(&self, confirm: bool) -> Result<TableCounts, ServiceError> {
        if !confirm {
            return Err(ServiceError::InvalidInput(
                "purging all history requires explicit confirmation".to_owned(),
            ));
        }
        let counts = self.storage.purge_all().await?;
        tracing::warn!(
            conversations = counts.conversations,
            messages = counts.messages,
            statistics = counts.daily_statistics,
            "Purged all chat history"
        );
        Ok(counts)
    }

    pub async fn health(&self) -> Result<HistoryHealth, ServiceError> {
        let counts = self.storage.table_counts().await?;
        Ok(HistoryHealth {
            status: "healthy".to_owned(),
            database: self.storage.kind().to_owned(),
            total_conversations: counts.conversations,
            total_messages: counts.messages,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test code")]

    use isp_chat_core::{NewConversation, NewMessage};

    use super::*;
    use crate::test_support::create_test_backend;

    async fn seed(storage: &StorageBackend, user: Option<&str>, text: &str) -> Conversation {
        let conversation = storage
            .create_conversation(&NewConversation::new(user.map(str::to_owned), "EN"))
            .await
            .unwrap();
        storage.append_message(&NewMessage::user(&conversation.id, text)).await.unwrap();
        conversation
    }

    #[tokio::test]
    async fn test_limit_out_of_range_is_rejected() {
        let (storage, _dir) = create_test_backend();
        let service = HistoryService::new(storage);

        let err = service.list_conversations(&ConversationFilter::default(), 0, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = service
            .list_conversations(&ConversationFilter::default(), 0, MAX_CONVERSATION_LIMIT + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_skip_beyond_i64_is_rejected() {
        let (storage, _dir) = create_test_backend();
        let service = HistoryService::new(storage);

        let err = service
            .list_conversations(&ConversationFilter::default(), usize::MAX, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        let err = service.search("router", None, usize::MAX, 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_search_requires_two_characters() {
        let (storage, _dir) = create_test_backend();
        seed(&storage, Some("7"), "my router blinks red").await;
        let service = HistoryService::new(storage);

        assert!(matches!(
            service.search(" r ", None, 0, 50).await.unwrap_err(),
            ServiceError::InvalidInput(_)
        ));
        let page = service.search("ROUTER", None, 0, 50).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_anonymous_user_conversations() {
        let (storage, _dir) = create_test_backend();
        seed(&storage, None, "hello").await;
        seed(&storage, None, "hello again").await;
        seed(&storage, Some("42"), "hi").await;
        let service = HistoryService::new(storage);

        let page = service.user_conversations("Anonymous", 0, 20).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|c| c.session_type == SessionType::Anonymous));
        let page = service.user_conversations("42", 0, 20).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_chat_history_spans_conversations() {
        let (storage, _dir) = create_test_backend();
        let first = seed(&storage, Some("42"), "first").await;
        let second = seed(&storage, Some("42"), "second").await;
        let service = HistoryService::new(storage);

        let history = service.chat_history("42", 500).await.unwrap();
        assert_eq!(history.total_messages, 2);
        assert_eq!(history.total_conversations, 2);
        assert_eq!(history.messages[0].message.conversation_id, first.id);
        assert_eq!(history.messages[1].message.conversation_id, second.id);
    }

    #[tokio::test]
    async fn test_purge_requires_confirmation() {
        let (storage, _dir) = create_test_backend();
        seed(&storage, Some("42"), "hello").await;
        let service = HistoryService::new(storage);

        assert!(matches!(service.purge_all(false).await.unwrap_err(), ServiceError::InvalidInput(_)));
        assert_eq!(service.health().await.unwrap().total_messages, 1);

        let counts = service.purge_all(true).await.unwrap();
        assert_eq!(counts.conversations, 1);
        assert_eq!(counts.messages, 1);
        let health = service.health().await.unwrap();
        assert_eq!(health.total_conversations, 0);
        assert_eq!(health.database, "sqlite");
    }

    #[tokio::test]
    async fn test_statistics_validation() {
        let (storage, _dir) = create_test_backend();
        seed(&storage, Some("42"), "hello").await;
        let service = HistoryService::new(storage);

        assert!(service.daily_statistics(None, None, 0).await.is_err());
        assert!(service.daily_statistics(None, None, MAX_STATS_DAYS + 1).await.is_err());
        assert!(service.daily_statistics(Some("yesterday"), None, 7).await.is_err());

        let buckets = service.daily_statistics(None, Some("42"), 7).await.unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].user_messages, 1);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_not_found() {
        let (storage, _dir) = create_test_backend();
        let service = HistoryService::new(storage);

        let err = service
            .conversation_messages("user_1_missing", &MessageFilter::default(), 0, 50)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!service.delete_conversation("user_1_missing").await.unwrap());
        assert!(!service.delete_message(999).await.unwrap());
    }
}

//! QueryStore implementation for PgStorage.
//!
//! Optional filters are bound as nullable parameters (`$n IS NULL OR col = $n`)
//! so every query has one fixed SQL text.

use async_trait::async_trait;
use isp_chat_core::constants::is_anonymous_user;
use isp_chat_core::{Conversation, ConversationFilter, Message, MessageFilter, Page, PageRequest};
use sqlx::Row;

use super::{
    CONVERSATION_COLUMNS, MESSAGE_COLUMNS, PgStorage, row_to_conversation, row_to_message, to_u64,
};
use crate::error::StorageError;
use crate::traits::QueryStore;
use crate::types::{ConversationMessages, UserMessage, UserMessages};

const OWNER_CLAUSE: &str = "(($1 AND c.session_type = 'anonymous') OR (NOT $1 AND c.user_id = $2))";

fn window(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.limit).unwrap_or(i64::MAX),
        i64::try_from(page.skip).unwrap_or(i64::MAX),
    )
}

/// Escape special characters for LIKE pattern matching
fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl QueryStore for PgStorage {
    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>, StorageError> {
        let conditions = "($1::text IS NULL OR user_id = $1)
             AND ($2::text IS NULL OR session_type = $2)
             AND ($3::text IS NULL OR language = $3)
             AND ($4::timestamptz IS NULL OR created_at >= $4)
             AND ($5::timestamptz IS NULL OR created_at <= $5)";
        let session_type = filter.session_type.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM conversations WHERE {conditions}"))
                .bind(&filter.user_id)
                .bind(session_type)
                .bind(&filter.language)
                .bind(filter.date_from)
                .bind(filter.date_to)
                .fetch_one(&self.pool)
                .await?;

        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE {conditions}
             ORDER BY updated_at DESC, id LIMIT $6 OFFSET $7"
        ))
        .bind(&filter.user_id)
        .bind(session_type)
        .bind(&filter.language)
        .bind(filter.date_from)
        .bind(filter.date_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_conversation).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    async fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<ConversationMessages, StorageError> {
        let context: Option<(Option<String>, String)> =
            sqlx::query_as("SELECT user_id, language FROM conversations WHERE id = $1")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        let conditions = "m.conversation_id = $1
             AND ($2::text IS NULL OR m.role = $2)
             AND ($3::text IS NULL OR m.message_level = $3)
             AND ($4::text IS NULL OR m.category = $4)";
        let role = filter.role.map(|r| r.as_str());
        let level = filter.level.map(|l| l.as_str());

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM messages m WHERE {conditions}"))
                .bind(conversation_id)
                .bind(role)
                .bind(level)
                .bind(&filter.category)
                .fetch_one(&self.pool)
                .await?;
        if total == 0 && context.is_none() {
            return Err(StorageError::NotFound {
                entity: "conversation",
                id: conversation_id.to_owned(),
            });
        }

        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m WHERE {conditions}
             ORDER BY m.message_index LIMIT $5 OFFSET $6"
        ))
        .bind(conversation_id)
        .bind(role)
        .bind(level)
        .bind(&filter.category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()?;

        let (user_id, language) = context.map_or((None, None), |(u, l)| (u, Some(l)));
        Ok(ConversationMessages {
            conversation_id: conversation_id.to_owned(),
            user_id,
            language,
            page: Page::new(items, to_u64(total), page),
        })
    }

    async fn user_messages(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<UserMessages, StorageError> {
        let anonymous = is_anonymous_user(user_id);
        let joined = "messages m JOIN conversations c ON c.id = m.conversation_id";

        let (total, conversations): (i64, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*), COUNT(DISTINCT m.conversation_id) FROM {joined} WHERE {OWNER_CLAUSE}"
        ))
        .bind(anonymous)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS}, c.created_at AS conversation_created, c.language
             FROM {joined} WHERE {OWNER_CLAUSE}
             ORDER BY m.created_at, m.id LIMIT $3 OFFSET $4"
        ))
        .bind(anonymous)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows
            .iter()
            .map(|row| {
                Ok(UserMessage {
                    message: row_to_message(row)?,
                    conversation_created: row.try_get("conversation_created")?,
                    language: row.try_get("language")?,
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        let total = to_u64(total);
        Ok(UserMessages {
            user_id: user_id.to_owned(),
            conversations_count: to_u64(conversations),
            has_more: page.has_more(total),
            next_skip: page.next_skip(total),
            page: Page::new(items, total, page),
        })
    }

    async fn search_messages(
        &self,
        term: &str,
        user_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Message>, StorageError> {
        let pattern = format!("%{}%", escape_like_pattern(term));
        let filter_user = user_id.is_some();
        let anonymous = user_id.is_some_and(is_anonymous_user);
        let conditions = "m.content ILIKE $3 ESCAPE '\\'
             AND (NOT $4 OR (($1 AND c.session_type = 'anonymous') OR (NOT $1 AND c.user_id = $2)))";
        let joined = "messages m JOIN conversations c ON c.id = m.conversation_id";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {joined} WHERE {conditions}"))
                .bind(anonymous)
                .bind(user_id)
                .bind(&pattern)
                .bind(filter_user)
                .fetch_one(&self.pool)
                .await?;

        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM {joined} WHERE {conditions}
             ORDER BY m.created_at DESC, m.id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(anonymous)
        .bind(user_id)
        .bind(&pattern)
        .bind(filter_user)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let items = rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }
}

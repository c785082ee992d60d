use isp_chat_core::constants::is_anonymous_user;
use isp_chat_core::{Conversation, ConversationFilter, Message, MessageFilter, Page, PageRequest};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use super::rows::{
    CONVERSATION_COLUMNS, MESSAGE_COLUMNS, qualified_message_columns, row_to_conversation,
    row_to_message, row_to_message_at,
};
use super::{Storage, escape_like_pattern, format_ts, get_conn, to_u64};
use crate::error::StorageError;
use crate::types::{ConversationMessages, UserMessage, UserMessages};

/// Conjunctive `WHERE` clause with positional parameters.
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    values: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, template: &str, value: Value) {
        self.values.push(value);
        self.clauses.push(template.replace('?', &format!("?{}", self.values.len())));
    }

    fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_owned());
    }

    fn sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Parameters for the filtered query followed by `LIMIT ? OFFSET ?`.
    fn with_window(&self, page: PageRequest) -> (String, Vec<Value>) {
        let mut values = self.values.clone();
        let n = values.len();
        values.push(Value::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(page.skip).unwrap_or(i64::MAX)));
        (format!("LIMIT ?{} OFFSET ?{}", n + 1, n + 2), values)
    }
}

fn count_where(conn: &Connection, from: &str, conditions: &Conditions) -> Result<u64, StorageError> {
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {from} {}", conditions.sql()),
        params_from_iter(&conditions.values),
        |row| row.get(0),
    )?;
    Ok(to_u64(n))
}

/// Restrict `c.` (conversations) rows to one user, or to anonymous sessions.
fn push_owner(conditions: &mut Conditions, user_id: &str) {
    if is_anonymous_user(user_id) {
        conditions.push_raw("c.session_type = 'anonymous'");
    } else {
        conditions.push("c.user_id = ?", Value::Text(user_id.to_owned()));
    }
}

impl Storage {
    /// Conversations matching every set filter, most recently updated first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn list_conversations(
        &self,
        filter: &ConversationFilter,
        page: PageRequest,
    ) -> Result<Page<Conversation>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut conditions = Conditions::default();
        if let Some(user_id) = &filter.user_id {
            conditions.push("user_id = ?", Value::Text(user_id.clone()));
        }
        if let Some(session_type) = filter.session_type {
            conditions.push("session_type = ?", Value::Text(session_type.as_str().to_owned()));
        }
        if let Some(language) = &filter.language {
            conditions.push("language = ?", Value::Text(language.clone()));
        }
        if let Some(from) = filter.date_from {
            conditions.push("created_at >= ?", Value::Text(format_ts(from)));
        }
        if let Some(to) = filter.date_to {
            conditions.push("created_at <= ?", Value::Text(format_ts(to)));
        }

        let total = count_where(&conn, "conversations", &conditions)?;
        let (window, values) = conditions.with_window(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations {}
             ORDER BY updated_at DESC, id {window}",
            conditions.sql()
        ))?;
        let items = stmt
            .query_map(params_from_iter(values), row_to_conversation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }

    /// One page of a conversation's messages in `message_index` order.
    ///
    /// # Errors
    /// Returns `NotFound` when no message matched and the conversation is unknown.
    pub fn conversation_messages(
        &self,
        conversation_id: &str,
        filter: &MessageFilter,
        page: PageRequest,
    ) -> Result<ConversationMessages, StorageError> {
        let conn = get_conn(&self.pool)?;
        let context: Option<(Option<String>, String)> = conn
            .query_row(
                "SELECT user_id, language FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let mut conditions = Conditions::default();
        conditions.push("conversation_id = ?", Value::Text(conversation_id.to_owned()));
        if let Some(role) = filter.role {
            conditions.push("role = ?", Value::Text(role.as_str().to_owned()));
        }
        if let Some(level) = filter.level {
            conditions.push("message_level = ?", Value::Text(level.as_str().to_owned()));
        }
        if let Some(category) = &filter.category {
            conditions.push("category = ?", Value::Text(category.clone()));
        }

        let total = count_where(&conn, "messages", &conditions)?;
        if total == 0 && context.is_none() {
            return Err(StorageError::NotFound {
                entity: "conversation",
                id: conversation_id.to_owned(),
            });
        }

        let (window, values) = conditions.with_window(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages {} ORDER BY message_index {window}",
            conditions.sql()
        ))?;
        let items = stmt
            .query_map(params_from_iter(values), row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;

        let (user_id, language) = context.map_or((None, None), |(u, l)| (u, Some(l)));
        Ok(ConversationMessages {
            conversation_id: conversation_id.to_owned(),
            user_id,
            language,
            page: Page::new(items, total, page),
        })
    }

    /// Messages across every conversation of `user_id`, oldest first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn user_messages(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<UserMessages, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut conditions = Conditions::default();
        push_owner(&mut conditions, user_id);

        let joined = "messages m JOIN conversations c ON c.id = m.conversation_id";
        let total = count_where(&conn, joined, &conditions)?;
        let conversations: i64 = conn.query_row(
            &format!("SELECT COUNT(DISTINCT m.conversation_id) FROM {joined} {}", conditions.sql()),
            params_from_iter(&conditions.values),
            |row| row.get(0),
        )?;

        let (window, values) = conditions.with_window(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, c.created_at, c.language FROM {joined} {}
             ORDER BY m.created_at, m.id {window}",
            qualified_message_columns(),
            conditions.sql()
        ))?;
        let items = stmt
            .query_map(params_from_iter(values), |row| {
                let message = row_to_message_at(row, 0)?;
                let created: String = row.get(16)?;
                let conversation_created = chrono::DateTime::parse_from_rfc3339(&created)
                    .map(|d| d.with_timezone(&chrono::Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            16,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(UserMessage { message, conversation_created, language: row.get(17)? })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(UserMessages {
            user_id: user_id.to_owned(),
            conversations_count: to_u64(conversations),
            has_more: page.has_more(total),
            next_skip: page.next_skip(total),
            page: Page::new(items, total, page),
        })
    }

    /// Case-insensitive substring search over message content, newest first.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn search_messages(
        &self,
        term: &str,
        user_id: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Message>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut conditions = Conditions::default();
        conditions.push(
            "m.content LIKE ? ESCAPE '\\'",
            Value::Text(format!("%{}%", escape_like_pattern(term))),
        );
        if let Some(user_id) = user_id {
            push_owner(&mut conditions, user_id);
        }

        let joined = "messages m JOIN conversations c ON c.id = m.conversation_id";
        let total = count_where(&conn, joined, &conditions)?;
        let (window, values) = conditions.with_window(page);
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {joined} {} ORDER BY m.created_at DESC, m.id DESC {window}",
            qualified_message_columns(),
            conditions.sql()
        ))?;
        let items = stmt
            .query_map(params_from_iter(values), row_to_message)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }
}

//! Request/query types (Deserialize)

use isp_chat_core::constants::{
    DEFAULT_CONVERSATION_LIMIT, DEFAULT_LANGUAGE, DEFAULT_MESSAGE_LIMIT, DEFAULT_STATS_DAYS,
    DEFAULT_USER_HISTORY_LIMIT,
};
use isp_chat_core::{
    ConversationFilter, DateBound, MessageFilter, MessageLevel, Role, SessionType,
    parse_date_bound,
};
use serde::Deserialize;

use crate::api_error::ApiError;

const fn default_conversation_limit() -> usize {
    DEFAULT_CONVERSATION_LIMIT
}

const fn default_message_limit() -> usize {
    DEFAULT_MESSAGE_LIMIT
}

const fn default_history_limit() -> usize {
    DEFAULT_USER_HISTORY_LIMIT
}

const fn default_days() -> u32 {
    DEFAULT_STATS_DAYS
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_owned()
}

/// Empty query values (`?user_id=`) count as absent.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatHistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConversationListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_conversation_limit")]
    pub limit: usize,
    pub user_id: Option<String>,
    pub session_type: Option<String>,
    pub language: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ConversationListQuery {
    pub fn filter(&self) -> Result<ConversationFilter, ApiError> {
        Ok(ConversationFilter {
            user_id: present(self.user_id.as_ref()).map(str::to_owned),
            session_type: present(self.session_type.as_ref())
                .map(str::parse::<SessionType>)
                .transpose()?,
            language: present(self.language.as_ref()).map(str::to_owned),
            date_from: present(self.date_from.as_ref())
                .map(|d| parse_date_bound(d, DateBound::Start))
                .transpose()?,
            date_to: present(self.date_to.as_ref())
                .map(|d| parse_date_bound(d, DateBound::End))
                .transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationMessagesQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_message_limit")]
    pub limit: usize,
    pub role_filter: Option<String>,
    pub level_filter: Option<String>,
    pub category_filter: Option<String>,
}

impl ConversationMessagesQuery {
    pub fn filter(&self) -> Result<MessageFilter, ApiError> {
        Ok(MessageFilter {
            role: present(self.role_filter.as_ref()).map(str::parse::<Role>).transpose()?,
            level: present(self.level_filter.as_ref())
                .map(str::parse::<MessageLevel>)
                .transpose()?,
            category: present(self.category_filter.as_ref()).map(str::to_owned),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UserConversationsQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_conversation_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct UserMessagesQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_message_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub date: Option<String>,
    pub user_id: Option<String>,
    #[serde(default = "default_days")]
    pub days: u32,
}

impl StatisticsQuery {
    pub fn date(&self) -> Option<&str> {
        present(self.date.as_ref())
    }

    pub fn user_id(&self) -> Option<&str> {
        present(self.user_id.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_message_limit")]
    pub limit: usize,
}

impl SearchQuery {
    pub fn user_id(&self) -> Option<&str> {
        present(self.user_id.as_ref())
    }
}

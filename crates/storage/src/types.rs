//! Result shapes returned by the query and admin operations.

use chrono::{DateTime, Utc};
use isp_chat_core::{Message, Page};
use serde::{Deserialize, Serialize};

/// One page of a conversation's messages plus conversation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessages {
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub language: Option<String>,
    #[serde(flatten)]
    pub page: Page<Message>,
}

/// A message joined with facts about its conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    #[serde(flatten)]
    pub message: Message,
    pub conversation_created: DateTime<Utc>,
    pub language: String,
}

/// Chronological messages across every conversation of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessages {
    pub user_id: String,
    pub conversations_count: u64,
    pub has_more: bool,
    pub next_skip: Option<usize>,
    #[serde(flatten)]
    pub page: Page<UserMessage>,
}

/// Selection for [`crate::traits::StatsStore::daily_statistics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsQuery {
    /// Exact bucket date (`YYYY-MM-DD`); overrides `days`.
    pub date: Option<String>,
    /// `"anonymous"` selects the anonymous bucket.
    pub user_id: Option<String>,
    /// Trailing window in days ending today.
    pub days: u32,
}

impl Default for StatsQuery {
    fn default() -> Self {
        Self { date: None, user_id: None, days: isp_chat_core::constants::DEFAULT_STATS_DAYS }
    }
}

/// Counts removed by a per-user deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserResult {
    pub deleted_conversations: u64,
    pub deleted_messages: u64,
    pub deleted_statistics: u64,
}

/// Row counts of the three tables; returned by purge (pre-deletion) and health checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub conversations: u64,
    pub messages: u64,
    pub daily_statistics: u64,
}

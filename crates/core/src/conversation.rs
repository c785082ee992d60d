use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LANGUAGE;
use crate::error::CoreError;

/// Whether a conversation belongs to an identified user or an anonymous visitor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    User,
    Anonymous,
}

impl SessionType {
    /// Session type implied by the presence of a user id.
    #[must_use]
    pub fn for_user(user_id: Option<&str>) -> Self {
        match user_id {
            Some(_) => Self::User,
            None => Self::Anonymous,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::User => "user",
            Self::Anonymous => "anonymous",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "anonymous" => Ok(Self::Anonymous),
            other => Err(CoreError::InvalidSessionType(other.to_owned())),
        }
    }
}

/// A persisted thread of messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub user_id: Option<String>,
    pub session_type: SessionType,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub total_messages: u64,
    pub total_tokens_used: u64,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl Conversation {
    /// Build a fresh, empty conversation for the given request context.
    #[must_use]
    pub fn start(input: &NewConversation, now: DateTime<Utc>) -> Self {
        let user_id = input.user_id.clone().filter(|u| !u.trim().is_empty());
        Self {
            id: generate_conversation_id(user_id.as_deref(), now),
            session_type: SessionType::for_user(user_id.as_deref()),
            user_id,
            language: input.language.clone(),
            created_at: now,
            updated_at: now,
            total_messages: 0,
            total_tokens_used: 0,
            user_agent: input.user_agent.clone(),
            ip_address: input.ip_address.clone(),
        }
    }
}

/// Request context for creating a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub user_id: Option<String>,
    pub language: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl NewConversation {
    #[must_use]
    pub fn new(user_id: Option<String>, language: impl Into<String>) -> Self {
        Self { user_id, language: language.into(), user_agent: None, ip_address: None }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None, DEFAULT_LANGUAGE)
    }

    #[must_use]
    pub fn with_client(mut self, user_agent: Option<String>, ip_address: Option<String>) -> Self {
        self.user_agent = user_agent;
        self.ip_address = ip_address;
        self
    }
}

/// Build a conversation identifier: session prefix, UTC timestamp, random suffix.
///
/// `user_{id}_{YYYYmmdd_HHMMSS}_{8 hex}` for identified users,
/// `anonymous_{YYYYmmdd_HHMMSS}_{12 hex}` otherwise.
#[must_use]
pub fn generate_conversation_id(user_id: Option<&str>, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d_%H%M%S");
    let random = uuid::Uuid::new_v4().simple().to_string();
    match user_id {
        Some(uid) => format!("user_{uid}_{timestamp}_{}", &random[..8]),
        None => format!("anonymous_{timestamp}_{}", &random[..12]),
    }
}

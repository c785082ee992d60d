//! Message records and their classification enums.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(CoreError::InvalidRole(other.to_owned())),
        }
    }
}

/// Coarse risk/priority tag derived from keyword heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Low,
    Mid,
    High,
    Critical,
    Sensitive,
}

impl MessageLevel {
    pub const ALL_VARIANTS_STR: &'static str = "low|mid|high|critical|sensitive";

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
            Self::Critical => "critical",
            Self::Sensitive => "sensitive",
        }
    }
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "mid" => Ok(Self::Mid),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            "sensitive" => Ok(Self::Sensitive),
            other => Err(CoreError::InvalidMessageLevel(other.to_owned())),
        }
    }
}

/// One persisted turn within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub conversation_id: String,
    pub role: Role,
    pub sender: String,
    pub content: String,
    /// 1-based position within the conversation; never reused.
    pub message_index: u32,
    pub message_level: MessageLevel,
    pub category: Option<String>,
    pub tokens_used: u64,
    pub response_time_ms: f64,
    pub store: bool,
    pub contains_user_data: bool,
    pub requires_follow_up: bool,
    pub tools_used: Vec<String>,
    pub api_calls_made: u32,
    pub created_at: DateTime<Utc>,
}

/// Input for appending a message to a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub conversation_id: String,
    pub role: Role,
    pub sender: String,
    pub content: String,
    pub message_level: MessageLevel,
    pub category: Option<String>,
    pub tokens_used: u64,
    pub response_time_ms: f64,
    pub store: bool,
    pub tools_used: Vec<String>,
    pub api_calls_made: u32,
}

impl NewMessage {
    /// A message with default analytics fields; sender mirrors the role.
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            role,
            sender: role.as_str().to_owned(),
            content: content.into(),
            message_level: MessageLevel::Low,
            category: None,
            tokens_used: 0,
            response_time_ms: 0.0,
            store: true,
            tools_used: Vec::new(),
            api_calls_made: 0,
        }
    }

    #[must_use]
    pub fn user(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::User, content)
    }

    #[must_use]
    pub fn assistant(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::Assistant, content)
    }

    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    #[must_use]
    pub fn classified(mut self, level: MessageLevel, category: Option<String>) -> Self {
        self.message_level = level;
        self.category = category;
        self
    }

    #[must_use]
    pub const fn tokens_used(mut self, tokens: u64) -> Self {
        self.tokens_used = tokens;
        self
    }

    #[must_use]
    pub const fn response_time_ms(mut self, ms: f64) -> Self {
        self.response_time_ms = ms;
        self
    }

    #[must_use]
    pub const fn store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn tools_used(mut self, tools: Vec<String>) -> Self {
        self.tools_used = tools;
        self
    }

    #[must_use]
    pub const fn api_calls_made(mut self, calls: u32) -> Self {
        self.api_calls_made = calls;
        self
    }
}

/// Rough token estimate used for analytics: whitespace-separated word count.
#[must_use]
pub fn estimate_tokens(texts: &[&str]) -> u64 {
    texts.iter().map(|t| t.split_whitespace().count() as u64).sum()
}

//! Per-(date, user) rolling aggregate of message activity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageLevel, Role};

/// Date format of a daily bucket key.
pub const BUCKET_DATE_FORMAT: &str = "%Y-%m-%d";

/// Message counts per sensitivity level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelCounts {
    pub low: u64,
    pub mid: u64,
    pub high: u64,
    pub critical: u64,
    pub sensitive: u64,
}

impl LevelCounts {
    pub fn increment(&mut self, level: MessageLevel) {
        let slot = match level {
            MessageLevel::Low => &mut self.low,
            MessageLevel::Mid => &mut self.mid,
            MessageLevel::High => &mut self.high,
            MessageLevel::Critical => &mut self.critical,
            MessageLevel::Sensitive => &mut self.sensitive,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.low + self.mid + self.high + self.critical + self.sensitive
    }
}

/// One analytics bucket keyed by `(date, user_id)`; `user_id = None` is the anonymous bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyStatistics {
    pub date: String,
    pub user_id: Option<String>,
    pub total_conversations: u64,
    pub total_messages: u64,
    pub user_messages: u64,
    pub assistant_messages: u64,
    pub total_tokens: u64,
    pub message_levels: LevelCounts,
    pub total_api_calls: u64,
    pub avg_response_time_ms: f64,
}

impl DailyStatistics {
    /// Empty bucket for the given key.
    #[must_use]
    pub fn empty(date: impl Into<String>, user_id: Option<String>) -> Self {
        Self { date: date.into(), user_id, ..Self::default() }
    }

    /// Fold one appended message into the bucket.
    ///
    /// The response-time average is updated with the assistant count taken
    /// before this message is counted.
    pub fn record_message(&mut self, message: &Message) {
        let prior_assistant = self.assistant_messages;

        self.total_messages = self.total_messages.saturating_add(1);
        match message.role {
            Role::User => self.user_messages = self.user_messages.saturating_add(1),
            Role::Assistant => self.assistant_messages = self.assistant_messages.saturating_add(1),
        }
        self.total_tokens = self.total_tokens.saturating_add(message.tokens_used);
        self.total_api_calls = self.total_api_calls.saturating_add(u64::from(message.api_calls_made));
        self.message_levels.increment(message.message_level);

        if message.role == Role::Assistant && message.response_time_ms > 0.0 {
            self.avg_response_time_ms =
                running_average(self.avg_response_time_ms, prior_assistant, message.response_time_ms);
        }
    }
}

/// Weighted running mean: `(old_avg * old_count + value) / (old_count + 1)`.
#[must_use]
pub fn running_average(old_avg: f64, old_count: u64, value: f64) -> f64 {
    let count = old_count as f64;
    (old_avg * count + value) / (count + 1.0)
}

/// Bucket key for a timestamp.
#[must_use]
pub fn bucket_date(ts: DateTime<Utc>) -> String {
    ts.format(BUCKET_DATE_FORMAT).to_string()
}

/// Oldest bucket date included in a trailing window of `days` ending at `today`.
#[must_use]
pub fn window_start(today: NaiveDate, days: u32) -> String {
    let start = today - chrono::Duration::days(i64::from(days));
    start.format(BUCKET_DATE_FORMAT).to_string()
}

//! Conjunctive filters for conversation and message listings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::SessionType;
use crate::error::CoreError;
use crate::message::{MessageLevel, Role};

/// Filters for listing conversations; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationFilter {
    pub user_id: Option<String>,
    pub session_type: Option<SessionType>,
    pub language: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub date_to: Option<DateTime<Utc>>,
}

impl ConversationFilter {
    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self { user_id: Some(user_id.into()), ..Self::default() }
    }
}

/// Filters for listing the messages of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFilter {
    pub role: Option<Role>,
    pub level: Option<MessageLevel>,
    pub category: Option<String>,
}

/// Which end of a day a bare date should resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parse a filter date given as `YYYY-MM-DD` or RFC 3339.
///
/// A bare date resolves to `00:00:00` for [`DateBound::Start`] and to the last
/// representable instant of the day for [`DateBound::End`].
pub fn parse_date_bound(raw: &str, bound: DateBound) -> Result<DateTime<Utc>, CoreError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, crate::statistics::BUCKET_DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(raw.to_owned()))?;
    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| CoreError::InvalidDate(raw.to_owned()))?,
    };
    Ok(date.and_time(time).and_utc())
}

/// Validate a bucket date (`YYYY-MM-DD`).
pub fn parse_bucket_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), crate::statistics::BUCKET_DATE_FORMAT)
        .map_err(|_| CoreError::InvalidDate(raw.to_owned()))
}

//! Keyword classification of chat messages.
//!
//! Matching is case-insensitive substring search; rule tables are evaluated in
//! order and the first table with any hit wins.

use serde::{Deserialize, Serialize};

use crate::message::MessageLevel;

const LEVEL_RULES: &[(MessageLevel, &[&str])] = &[
    (
        MessageLevel::Sensitive,
        &["password", "pin", "credit card", "bank", "nid", "account number", "cvv"],
    ),
    (MessageLevel::Critical, &["payment", "bill", "money", "expire", "disconnect", "due"]),
    (
        MessageLevel::High,
        &["internet", "connection", "router", "speed", "not working", "problem", "issue"],
    ),
    (MessageLevel::Mid, &["package", "subscription", "plan", "upgrade", "movie", "server"]),
];

const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("billing", &["bill", "payment", "money", "due", "pay"]),
    ("technical", &["internet", "connection", "router", "speed", "not working"]),
    ("packages", &["package", "plan", "subscription", "upgrade"]),
    ("entertainment", &["movie", "server", "ftp", "ott", "stream"]),
    ("account", &["account", "user id", "profile", "details"]),
];

const USER_DATA_PATTERNS: &[&str] = &[
    "password",
    "credit card",
    "ssn",
    "social security",
    "bank account",
    "pin",
    "cvv",
    "passport",
];

/// Category assigned when no rule matches.
pub const GENERAL_CATEGORY: &str = "general";

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub level: MessageLevel,
    pub category: String,
}

/// Classify `text` into a sensitivity level and category.
#[must_use]
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();
    Classification { level: level_of(&lowered), category: category_of(&lowered).to_owned() }
}

/// Sensitivity level of `text`.
#[must_use]
pub fn classify_level(text: &str) -> MessageLevel {
    level_of(&text.to_lowercase())
}

/// Category label of `text`.
#[must_use]
pub fn detect_category(text: &str) -> &'static str {
    category_of(&text.to_lowercase())
}

/// Whether `text` mentions personal-data patterns, independent of its level.
#[must_use]
pub fn contains_user_data(text: &str) -> bool {
    contains_any(&text.to_lowercase(), USER_DATA_PATTERNS)
}

fn level_of(lowered: &str) -> MessageLevel {
    LEVEL_RULES
        .iter()
        .find(|(_, keywords)| contains_any(lowered, keywords))
        .map_or(MessageLevel::Low, |(level, _)| *level)
}

fn category_of(lowered: &str) -> &'static str {
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| contains_any(lowered, keywords))
        .map_or(GENERAL_CATEGORY, |(category, _)| category)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_beats_critical() {
        let c = classify("what is my password for the bill");
        assert_eq!(c.level, MessageLevel::Sensitive);
        assert_eq!(c.category, "billing");
    }

    #[test]
    fn test_password_without_category_keyword() {
        let c = classify("My password isn't working");
        assert_eq!(c.level, MessageLevel::Sensitive);
        assert_eq!(c.category, "general");
    }

    #[test]
    fn test_level_precedence_chain() {
        assert_eq!(classify_level("my payment is due"), MessageLevel::Critical);
        assert_eq!(classify_level("Router keeps rebooting"), MessageLevel::High);
        assert_eq!(classify_level("show me a faster PLAN"), MessageLevel::Mid);
        assert_eq!(classify_level("hello there"), MessageLevel::Low);
    }

    #[test]
    fn test_category_precedence_chain() {
        assert_eq!(detect_category("internet speed is slow"), "technical");
        assert_eq!(detect_category("upgrade my subscription"), "packages");
        assert_eq!(detect_category("which ftp servers exist"), "entertainment");
        assert_eq!(detect_category("update my profile"), "account");
        assert_eq!(detect_category("thanks!"), "general");
    }

    #[test]
    fn test_billing_wins_over_technical() {
        assert_eq!(detect_category("internet cut because bill unpaid"), "billing");
    }

    #[test]
    fn test_empty_text_is_low_general() {
        let c = classify("");
        assert_eq!(c.level, MessageLevel::Low);
        assert_eq!(c.category, GENERAL_CATEGORY);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let text = "My connection has a problem since the upgrade";
        assert_eq!(classify(text), classify(text));
    }

    #[test]
    fn test_user_data_detection() {
        assert!(contains_user_data("my Passport number is X"));
        assert!(contains_user_data("Social Security details"));
        assert!(!contains_user_data("is the internet down?"));
    }
}

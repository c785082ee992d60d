//! Best-effort recovery of `{reply, metadata}` from model output.
//!
//! The generator is asked for a JSON object but its output format is not
//! guaranteed. [`parse_reply`] runs an ordered chain of [`ParseStrategy`]
//! values and never returns an empty reply for non-empty input.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::EMPTY_REPLY_FALLBACK;
use crate::json_utils::{object_span, repair_trailing_commas, strip_code_fence};
use crate::message::Role;

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static REPLY_FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"reply"\s*:\s*"((?:\\.|[^"\\])*)"#).unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static REPLY_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""reply"\s*:\s*"#).unwrap());

/// Recovery strategy that produced the final reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// Whole object parsed as JSON (after trailing-comma repair).
    StrictJson,
    /// `"reply"` string value pulled out with a regex.
    ReplyField,
    /// Cleaned input used as-is.
    Verbatim,
    /// Every extraction came back empty; the untouched raw input was used.
    RawInput,
    /// Input was empty; canned apology.
    CannedFallback,
}

impl ParseStrategy {
    /// Strategies tried in order against the cleaned input.
    pub const CHAIN: [Self; 3] = [Self::StrictJson, Self::ReplyField, Self::Verbatim];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::StrictJson => "strict_json",
            Self::ReplyField => "reply_field",
            Self::Verbatim => "verbatim",
            Self::RawInput => "raw_input",
            Self::CannedFallback => "canned_fallback",
        }
    }

    fn attempt(self, cleaned: &str) -> Option<Extraction> {
        match self {
            Self::StrictJson => extract_strict(cleaned),
            Self::ReplyField => extract_reply_field(cleaned),
            Self::Verbatim => Some(Extraction { reply: cleaned.to_owned(), metadata: None }),
            Self::RawInput | Self::CannedFallback => None,
        }
    }
}

impl std::fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata accompanying a reply. Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMetadata {
    pub role: String,
    pub sender: String,
    pub store: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ReplyMetadata {
    fn default() -> Self {
        Self {
            role: Role::Assistant.as_str().to_owned(),
            sender: Role::Assistant.as_str().to_owned(),
            store: true,
            extra: Map::new(),
        }
    }
}

impl ReplyMetadata {
    /// Lenient conversion from a JSON object; missing or mistyped fields keep defaults.
    #[must_use]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map_or(fallback, str::to_owned)
        };
        let store = object.get("store").and_then(lenient_bool).unwrap_or(defaults.store);
        let extra = object
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "role" | "sender" | "store"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { role: text("role", defaults.role), sender: text("sender", defaults.sender), store, extra }
    }

    /// Role named by the metadata, falling back to assistant.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Assistant)
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Result of [`parse_reply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub reply: String,
    pub metadata: ReplyMetadata,
    pub strategy: ParseStrategy,
    /// Whether a metadata object was found in the input.
    pub metadata_recovered: bool,
    /// Whether the reply was itself a JSON-encoded `{reply, ...}` that had to be unwrapped.
    pub unwrapped_nested: bool,
}

#[derive(Debug)]
struct Extraction {
    reply: String,
    metadata: Option<Map<String, Value>>,
}

/// Normalize raw generator output into a reply and its metadata.
#[must_use]
pub fn parse_reply(raw: &str) -> ParseOutcome {
    let cleaned = strip_code_fence(raw);

    let mut reply = String::new();
    let mut metadata = None;
    let mut strategy = ParseStrategy::Verbatim;
    for candidate in ParseStrategy::CHAIN {
        let Some(extraction) = candidate.attempt(cleaned) else {
            continue;
        };
        if metadata.is_none() {
            metadata = extraction.metadata;
        }
        if !extraction.reply.trim().is_empty() {
            reply = extraction.reply;
            strategy = candidate;
            break;
        }
    }
    if strategy != ParseStrategy::StrictJson {
        tracing::debug!(strategy = %strategy, "model output was not strict JSON");
    }

    let mut unwrapped_nested = false;
    if looks_double_encoded(&reply) {
        unwrapped_nested = true;
        let (inner, inner_metadata) = unwrap_nested(&reply);
        tracing::warn!("reply field contained an encoded reply object, unwrapping");
        reply = inner;
        if metadata.is_none() {
            metadata = inner_metadata;
        }
    }

    if reply.trim().is_empty() {
        if raw.trim().is_empty() {
            reply = EMPTY_REPLY_FALLBACK.to_owned();
            strategy = ParseStrategy::CannedFallback;
        } else {
            tracing::warn!("no reply text recovered, using raw model output");
            reply = raw.to_owned();
            strategy = ParseStrategy::RawInput;
        }
    }

    let reply = reply.replace("\\n", "\n").trim().to_owned();
    let metadata_recovered = metadata.is_some();
    let metadata = metadata.as_ref().map(ReplyMetadata::from_object).unwrap_or_default();

    ParseOutcome { reply, metadata, strategy, metadata_recovered, unwrapped_nested }
}

fn extract_strict(cleaned: &str) -> Option<Extraction> {
    let span = object_span(cleaned)?;
    let repaired = repair_trailing_commas(span);
    let Value::Object(object) = serde_json::from_str::<Value>(&repaired).ok()? else {
        return None;
    };
    let reply = match object.get("reply") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let metadata = object.get("metadata").and_then(Value::as_object).cloned();
    Some(Extraction { reply, metadata })
}

fn extract_reply_field(cleaned: &str) -> Option<Extraction> {
    let captures = REPLY_FIELD_REGEX.captures(cleaned)?;
    let value = captures.get(1)?.as_str();
    Some(Extraction { reply: unescape_reply(value), metadata: None })
}

fn unescape_reply(value: &str) -> String {
    value.replace("\\\"", "\"").replace("\\n", "\n")
}

fn looks_double_encoded(reply: &str) -> bool {
    reply.trim_start().starts_with('{') && reply.contains("\"reply\"")
}

/// One level of extraction on an encoded reply, then a character-stripping last resort.
fn unwrap_nested(reply: &str) -> (String, Option<Map<String, Value>>) {
    let trimmed = reply.trim();
    if let Some(inner) = extract_strict(trimmed).filter(|e| !e.reply.trim().is_empty()) {
        return (inner.reply, inner.metadata);
    }
    if let Some(inner) = extract_reply_field(trimmed).filter(|e| !e.reply.trim().is_empty()) {
        return (inner.reply, None);
    }
    let stripped = REPLY_LABEL_REGEX.replace_all(trimmed, "");
    let stripped = stripped.replace(['{', '}'], "");
    (stripped.trim().trim_matches('"').trim().to_owned(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json_with_metadata() {
        let raw = "```json\n{\"reply\": \"Hello!\", \"metadata\": {\"store\": false}}\n```";
        let out = parse_reply(raw);
        assert_eq!(out.reply, "Hello!");
        assert!(!out.metadata.store);
        assert_eq!(out.metadata.role, "assistant");
        assert_eq!(out.strategy, ParseStrategy::StrictJson);
        assert!(out.metadata_recovered);
    }

    #[test]
    fn test_plain_text_uses_default_metadata() {
        let out = parse_reply("Hello, just plain text");
        assert_eq!(out.reply, "Hello, just plain text");
        assert_eq!(out.metadata, ReplyMetadata::default());
        assert_eq!(out.strategy, ParseStrategy::Verbatim);
        assert!(!out.metadata_recovered);
    }

    #[test]
    fn test_trailing_commas_are_repaired() {
        let raw = "{\"reply\": \"Your bill is 500 BDT\", \"metadata\": {\"store\": true,},}";
        let out = parse_reply(raw);
        assert_eq!(out.reply, "Your bill is 500 BDT");
        assert_eq!(out.strategy, ParseStrategy::StrictJson);
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Sure! Here you go: {\"reply\": \"Done\", \"metadata\": {\"sender\": \"bot\"}} hope it helps";
        let out = parse_reply(raw);
        assert_eq!(out.reply, "Done");
        assert_eq!(out.metadata.sender, "bot");
        assert_eq!(out.metadata.role, "assistant");
    }

    #[test]
    fn test_truncated_json_falls_back_to_reply_field() {
        let raw = "{\"reply\": \"Line one\\nLine \\\"two\\\"\", \"metadata\": {\"store\": tr";
        let out = parse_reply(raw);
        assert_eq!(out.strategy, ParseStrategy::ReplyField);
        assert_eq!(out.reply, "Line one\nLine \"two\"");
        assert!(out.metadata.store);
    }

    #[test]
    fn test_unterminated_reply_string() {
        let out = parse_reply("{\"reply\": \"Your connection is being che");
        assert_eq!(out.strategy, ParseStrategy::ReplyField);
        assert_eq!(out.reply, "Your connection is being che");
    }

    #[test]
    fn test_double_encoded_reply_is_unwrapped() {
        let raw = r#"{"reply": "{\"reply\": \"Inner text\", \"metadata\": {}}", "metadata": {"store": true}}"#;
        let out = parse_reply(raw);
        assert_eq!(out.reply, "Inner text");
        assert!(out.unwrapped_nested);
    }

    #[test]
    fn test_double_encoded_garbage_is_stripped() {
        let raw = r#"{"reply": "{\"reply\": 42 ok}"}"#;
        let out = parse_reply(raw);
        assert!(out.unwrapped_nested);
        assert_eq!(out.reply, "42 ok");
    }

    #[test]
    fn test_empty_reply_field_keeps_content() {
        let raw = "{\"reply\": \"\", \"metadata\": {\"store\": false}}";
        let out = parse_reply(raw);
        assert!(!out.reply.is_empty());
        assert!(!out.metadata.store);
    }

    #[test]
    fn test_empty_input_gets_canned_reply() {
        let out = parse_reply("   ");
        assert_eq!(out.reply, EMPTY_REPLY_FALLBACK);
        assert_eq!(out.strategy, ParseStrategy::CannedFallback);
    }

    #[test]
    fn test_empty_fence_falls_back_to_raw() {
        let out = parse_reply("``````");
        assert_eq!(out.strategy, ParseStrategy::RawInput);
        assert_eq!(out.reply, "``````");
    }

    #[test]
    fn test_literal_escaped_newlines_are_normalized() {
        let out = parse_reply("First\\nSecond");
        assert_eq!(out.reply, "First\nSecond");
    }

    #[test]
    fn test_store_accepts_string_flag() {
        let out = parse_reply("{\"reply\": \"x\", \"metadata\": {\"store\": \"false\", \"tag\": 1}}");
        assert!(!out.metadata.store);
        assert_eq!(out.metadata.extra.get("tag"), Some(&Value::from(1)));
    }

    #[test]
    fn test_metadata_role_parsing() {
        let meta = ReplyMetadata { role: "USER".into(), ..ReplyMetadata::default() };
        assert_eq!(meta.role(), Role::User);
        let meta = ReplyMetadata { role: "system".into(), ..ReplyMetadata::default() };
        assert_eq!(meta.role(), Role::Assistant);
    }
}

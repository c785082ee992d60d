//! JSON repair helpers for model output.

use std::sync::LazyLock;

use regex::Regex;

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static TRAILING_COMMA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Strip markdown code fence wrappers.
///
/// The opening fence (with an optional language tag such as `json`) and the
/// closing fence are removed independently, so output truncated before the
/// closing fence is still unwrapped.
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((tag, body)) if is_language_tag(tag) => body,
            _ => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn is_language_tag(tag: &str) -> bool {
    tag.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
#[must_use]
pub fn object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Remove commas directly preceding a closing brace or bracket.
#[must_use]
pub fn repair_trailing_commas(content: &str) -> String {
    TRAILING_COMMA_REGEX.replace_all(content, "$1").into_owned()
}

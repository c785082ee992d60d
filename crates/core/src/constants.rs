//! Shared constants for isp-chat.
//!
//! Pagination bounds, pool sizing and the canned texts used by the chat pipeline.

/// Maximum page size for conversation listings.
pub const MAX_CONVERSATION_LIMIT: usize = 1000;

/// Maximum page size for message listings and search.
pub const MAX_MESSAGE_LIMIT: usize = 200;

/// Default page size for conversation listings.
pub const DEFAULT_CONVERSATION_LIMIT: usize = 20;

/// Default page size for message listings and search.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Default size of the cross-conversation user history; capped at `MAX_CONVERSATION_LIMIT`.
pub const DEFAULT_USER_HISTORY_LIMIT: usize = 500;

/// Default trailing window for daily statistics.
pub const DEFAULT_STATS_DAYS: u32 = 7;

/// Upper bound for the statistics window.
pub const MAX_STATS_DAYS: u32 = 90;

/// Minimum length of a message search term.
pub const MIN_SEARCH_TERM_LEN: usize = 2;

/// Number of prior messages handed to the model as context.
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

/// Default conversation language code.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Identifier that selects the anonymous bucket in user-scoped operations.
pub const ANONYMOUS_USER: &str = "anonymous";

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// SQLite connection pool size when `ISP_CHAT_DB_POOL_SIZE` is unset.
pub const DEFAULT_DB_POOL_SIZE: u32 = 8;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Reply used when the model produced nothing at all.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm sorry, I could not generate a response. Please try again.";

/// Reply used when the model call itself failed.
pub const GENERATION_ERROR_REPLY: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";

/// Whether `user_id` addresses the anonymous bucket (case-insensitive).
#[must_use]
pub fn is_anonymous_user(user_id: &str) -> bool {
    user_id.eq_ignore_ascii_case(ANONYMOUS_USER)
}

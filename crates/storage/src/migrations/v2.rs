//! Migration v2: follow-up flag, index high-water mark and analytics indexes

pub(super) const REQUIRES_FOLLOW_UP: &str = "requires_follow_up";
pub(super) const REQUIRES_FOLLOW_UP_DEF: &str = "INTEGER NOT NULL DEFAULT 0";

/// Highest `message_index` ever assigned in the conversation.
pub(super) const LAST_MESSAGE_INDEX: &str = "last_message_index";
pub(super) const LAST_MESSAGE_INDEX_DEF: &str = "INTEGER NOT NULL DEFAULT 0";

pub(super) const BACKFILL_SQL: &str = "
UPDATE conversations SET last_message_index =
    (SELECT COALESCE(MAX(message_index), 0) FROM messages WHERE conversation_id = conversations.id);
";

pub(super) const INDEX_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_messages_role_level ON messages(role, message_level);
CREATE INDEX IF NOT EXISTS idx_messages_category ON messages(category);
CREATE INDEX IF NOT EXISTS idx_daily_statistics_user ON daily_statistics(user_id, date);
";

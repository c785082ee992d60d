//! Migration v1: Initial schema

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    user_id TEXT,
    session_type TEXT NOT NULL DEFAULT 'anonymous',
    language TEXT NOT NULL DEFAULT 'EN',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    total_messages INTEGER NOT NULL DEFAULT 0,
    total_tokens_used INTEGER NOT NULL DEFAULT 0,
    user_agent TEXT,
    ip_address TEXT
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    sender TEXT NOT NULL,
    content TEXT NOT NULL,
    message_index INTEGER NOT NULL,
    message_level TEXT NOT NULL DEFAULT 'low',
    category TEXT,
    tokens_used INTEGER NOT NULL DEFAULT 0,
    response_time_ms REAL NOT NULL DEFAULT 0,
    store INTEGER NOT NULL DEFAULT 1,
    contains_user_data INTEGER NOT NULL DEFAULT 0,
    tools_used TEXT,
    api_calls_made INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS daily_statistics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    user_id TEXT,
    total_conversations INTEGER NOT NULL DEFAULT 0,
    total_messages INTEGER NOT NULL DEFAULT 0,
    user_messages INTEGER NOT NULL DEFAULT 0,
    assistant_messages INTEGER NOT NULL DEFAULT 0,
    total_tokens INTEGER NOT NULL DEFAULT 0,
    low_level_count INTEGER NOT NULL DEFAULT 0,
    mid_level_count INTEGER NOT NULL DEFAULT 0,
    high_level_count INTEGER NOT NULL DEFAULT 0,
    critical_level_count INTEGER NOT NULL DEFAULT 0,
    sensitive_level_count INTEGER NOT NULL DEFAULT 0,
    total_api_calls INTEGER NOT NULL DEFAULT 0,
    avg_response_time_ms REAL NOT NULL DEFAULT 0
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_conversation_index
    ON messages(conversation_id, message_index);
CREATE UNIQUE INDEX IF NOT EXISTS idx_daily_statistics_bucket
    ON daily_statistics(date, COALESCE(user_id, ''));
CREATE INDEX IF NOT EXISTS idx_conversations_user_created ON conversations(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations(updated_at);
CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created_at);
";

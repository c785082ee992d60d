//! PostgreSQL schema migrations for isp-chat storage.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        user_id TEXT,
        session_type TEXT NOT NULL DEFAULT 'anonymous',
        language TEXT NOT NULL DEFAULT 'EN',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        total_messages BIGINT NOT NULL DEFAULT 0,
        total_tokens_used BIGINT NOT NULL DEFAULT 0,
        user_agent TEXT,
        ip_address TEXT
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS messages (
        id BIGSERIAL PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
        role TEXT NOT NULL,
        sender TEXT NOT NULL,
        content TEXT NOT NULL,
        message_index INTEGER NOT NULL,
        message_level TEXT NOT NULL DEFAULT 'low',
        category TEXT,
        tokens_used BIGINT NOT NULL DEFAULT 0,
        response_time_ms DOUBLE PRECISION NOT NULL DEFAULT 0,
        store BOOLEAN NOT NULL DEFAULT TRUE,
        contains_user_data BOOLEAN NOT NULL DEFAULT FALSE,
        requires_follow_up BOOLEAN NOT NULL DEFAULT FALSE,
        tools_used JSONB,
        api_calls_made INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS daily_statistics (
        id BIGSERIAL PRIMARY KEY,
        date TEXT NOT NULL,
        user_id TEXT,
        total_conversations BIGINT NOT NULL DEFAULT 0,
        total_messages BIGINT NOT NULL DEFAULT 0,
        user_messages BIGINT NOT NULL DEFAULT 0,
        assistant_messages BIGINT NOT NULL DEFAULT 0,
        total_tokens BIGINT NOT NULL DEFAULT 0,
        low_level_count BIGINT NOT NULL DEFAULT 0,
        mid_level_count BIGINT NOT NULL DEFAULT 0,
        high_level_count BIGINT NOT NULL DEFAULT 0,
        critical_level_count BIGINT NOT NULL DEFAULT 0,
        sensitive_level_count BIGINT NOT NULL DEFAULT 0,
        total_api_calls BIGINT NOT NULL DEFAULT 0,
        avg_response_time_ms DOUBLE PRECISION NOT NULL DEFAULT 0
    )
    ",
    "ALTER TABLE conversations ADD COLUMN IF NOT EXISTS last_message_index INTEGER NOT NULL DEFAULT 0",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_conversation_index ON messages (conversation_id, message_index)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_daily_statistics_bucket ON daily_statistics (date, (COALESCE(user_id, '')))",
    "CREATE INDEX IF NOT EXISTS idx_conversations_user_created ON conversations (user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations (updated_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_messages_created ON messages (created_at)",
    "CREATE INDEX IF NOT EXISTS idx_messages_role_level ON messages (role, message_level)",
    "CREATE INDEX IF NOT EXISTS idx_messages_category ON messages (category)",
    "CREATE INDEX IF NOT EXISTS idx_daily_statistics_user ON daily_statistics (user_id, date)",
];

/// Run all PostgreSQL migrations. Every statement is idempotent.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(statements = STATEMENTS.len(), "PostgreSQL schema up to date");
    Ok(())
}

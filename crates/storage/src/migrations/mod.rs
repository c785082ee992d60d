//! SQLite schema, versioned through `PRAGMA user_version`.

mod column_helpers;
mod v1;
mod v2;

use column_helpers::add_column_if_not_exists;
use rusqlite::Connection;

pub const SCHEMA_VERSION: i32 = 2;

fn apply_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    add_column_if_not_exists(conn, "messages", v2::REQUIRES_FOLLOW_UP, v2::REQUIRES_FOLLOW_UP_DEF)?;
    add_column_if_not_exists(
        conn,
        "conversations",
        v2::LAST_MESSAGE_INDEX,
        v2::LAST_MESSAGE_INDEX_DEF,
    )?;
    conn.execute_batch(v2::BACKFILL_SQL)?;
    conn.execute_batch(v2::INDEX_SQL)
}

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let found: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found >= SCHEMA_VERSION {
        tracing::debug!(version = found, "Chat history schema up to date");
        return Ok(());
    }

    if found < 1 {
        tracing::info!("Creating conversations, messages and daily_statistics tables");
        conn.execute_batch(v1::SQL)?;
    }
    if found < 2 {
        tracing::info!("Adding follow-up flag, message index high-water mark and analytics indexes");
        apply_v2(conn)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tracing::info!(from = found, to = SCHEMA_VERSION, "Migrated chat history schema");
    Ok(())
}

//! Storage layer for isp-chat
//!
//! Conversations, their ordered messages and per-day usage buckets, kept in
//! SQLite (default) or PostgreSQL (`postgres` feature). Both backends expose
//! the same async store traits; [`StorageBackend`] picks one at runtime.

mod backend;
mod error;
#[cfg(feature = "sqlite")]
mod migrations;
#[cfg(feature = "postgres")]
mod pg_migrations;
#[cfg(feature = "postgres")]
pub mod pg_storage;
#[cfg(feature = "sqlite")]
mod sqlite_async;
#[cfg(feature = "sqlite")]
mod storage;
#[cfg(all(test, feature = "sqlite"))]
mod tests;
pub mod traits;
mod types;

pub use backend::StorageBackend;
pub use error::StorageError;
#[cfg(feature = "postgres")]
pub use pg_storage::PgStorage;
#[cfg(feature = "sqlite")]
pub use storage::Storage;
pub use types::{
    ConversationMessages, DeleteUserResult, StatsQuery, TableCounts, UserMessage, UserMessages,
};

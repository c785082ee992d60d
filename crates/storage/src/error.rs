//! Typed error enum for the storage layer.
//!
//! Callers match on specific failure modes (unknown entity, transient busy
//! database) instead of downcasting opaque boxes.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Row not found for an entity the caller required to exist.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// SQL / connection / timeout failure from the active backend.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Connection pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Row data could not be converted into a domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(String),

    /// The blocking task running a SQLite call panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Pool(_) => true,
            Self::Database(source) => is_transient_source(source.as_ref()),
            _ => false,
        }
    }

    /// Whether this error reports a missing entity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn corrupt(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataCorruption { context: context.into(), source: Box::new(source) }
    }
}

type Source = dyn std::error::Error + Send + Sync + 'static;

fn is_transient_source(source: &Source) -> bool {
    sqlite_busy(source) || postgres_timed_out(source)
}

#[cfg(feature = "sqlite")]
fn sqlite_busy(source: &Source) -> bool {
    source.downcast_ref::<rusqlite::Error>().is_some_and(|err| {
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    })
}

#[cfg(not(feature = "sqlite"))]
const fn sqlite_busy(_source: &Source) -> bool {
    false
}

#[cfg(feature = "postgres")]
fn postgres_timed_out(source: &Source) -> bool {
    source
        .downcast_ref::<sqlx::Error>()
        .is_some_and(|err| matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)))
}

#[cfg(not(feature = "postgres"))]
const fn postgres_timed_out(_source: &Source) -> bool {
    false
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => Self::DataCorruption {
                context: format!("column {column} holds an unreadable value"),
                source,
            },
            other => Self::Database(Box::new(other)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        Self::Pool(err.to_string())
    }
}

/// `RowNotFound` maps to a generic `NotFound`; callers remap it with entity context.
#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound { entity: "row", id: "unknown".into() },
            sqlx::Error::PoolTimedOut => Self::Pool("timed out acquiring a connection".into()),
            other => Self::Database(Box::new(other)),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::corrupt("JSON serialization/deserialization", err)
    }
}

impl From<isp_chat_core::CoreError> for StorageError {
    fn from(err: isp_chat_core::CoreError) -> Self {
        Self::corrupt("stored enum value", err)
    }
}

impl From<chrono::ParseError> for StorageError {
    fn from(err: chrono::ParseError) -> Self {
        Self::corrupt("stored timestamp", err)
    }
}

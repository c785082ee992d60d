use thiserror::Error;

/// Errors raised while interpreting domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid message level: {0}")]
    InvalidMessageLevel(String),

    #[error("Invalid session type: {0}")]
    InvalidSessionType(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

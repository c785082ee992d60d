//! Errors surfaced by the chat and history services.

use isp_chat_core::CoreError;
use isp_chat_llm::LlmError;
use isp_chat_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Only reachable from callers that bypass the apology fallback.
    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    /// Rejected request: empty message, bad date, out-of-range limit.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Busy database or exhausted pool; the request may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Llm(e) => e.is_transient(),
            Self::InvalidInput(_) => false,
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound { .. }))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

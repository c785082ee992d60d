//! Failures talking to the chat-completions endpoint or driving the tool loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("chat completion request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("chat completion returned HTTP {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("could not decode {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("chat completion returned no choices")]
    EmptyResponse,
    #[error("HTTP client could not be built: {0}")]
    ClientInit(String),
    #[error("{0} is not set")]
    MissingConfig(&'static str),
    #[error("gave up after retries: {0}")]
    RetriesExhausted(Box<LlmError>),
    /// The model kept asking for ISP tools past the round limit.
    #[error("model still requested tools after {0} rounds")]
    ToolLoopExhausted(usize),
}

impl LlmError {
    /// Rate limiting, overload and transport failures are retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => *code == 429 || (*code >= 500 && *code != 501),
            _ => false,
        }
    }
}

//! Typed error enum for the ISP API client.

use thiserror::Error;

/// Errors from ISP billing API calls.
#[derive(Debug, Error)]
pub enum IspError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("{endpoint} returned HTTP status {code}")]
    HttpStatus { endpoint: &'static str, code: u16 },
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl IspError {
    /// Message handed to the model in a `status: error` tool result.
    #[must_use]
    pub fn tool_message(&self) -> String {
        match self {
            Self::UserNotFound(_) => "User not found. Please verify the user ID.".to_owned(),
            Self::HttpStatus { code, .. } => format!("Request failed (Status: {code})"),
            Self::Unavailable(message) => message.clone(),
            other => format!("Error: {other}"),
        }
    }
}

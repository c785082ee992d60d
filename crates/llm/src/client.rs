use std::time::Duration;

use isp_chat_core::env_config::{env_parse_with_default, env_string};

use crate::ai_types::{ChatMessage, ChatRequest, ChatResponse};
use crate::error::LlmError;

/// Default OpenAI-compatible endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
/// Default LLM model to use.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const MAX_RETRIES: u32 = 3;

/// Connection settings for [`LlmClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read `ISP_CHAT_LLM_API_KEY` (required), `ISP_CHAT_LLM_URL`,
    /// `ISP_CHAT_MODEL` and `ISP_CHAT_LLM_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns `MissingConfig` when no API key is set.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key =
            env_string("ISP_CHAT_LLM_API_KEY").ok_or(LlmError::MissingConfig("ISP_CHAT_LLM_API_KEY"))?;
        Ok(Self {
            api_key,
            base_url: env_string("ISP_CHAT_LLM_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            model: env_string("ISP_CHAT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            timeout: Duration::from_secs(env_parse_with_default(
                "ISP_CHAT_LLM_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        })
    }

    /// Sets a custom model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Client for LLM API calls.
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    retry_delay: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("client", &self.client)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl LlmClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// First backoff step; later retries double it (1s, 2s, 4s by default).
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request and return the first choice's message.
    ///
    /// Transport errors and 429/5xx statuses are retried with exponential backoff.
    ///
    /// # Errors
    /// Returns an error if the API returns a non-transient error status, the
    /// response body cannot be parsed, the choices array is empty, or every
    /// retry failed.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = self.retry_delay.saturating_mul(1 << (attempt - 1));
                tokio::time::sleep(delay).await;
                tracing::warn!("LLM retry attempt {attempt}/{MAX_RETRIES} after {delay:?}");
            }

            let response_result = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await;

            let response = match response_result {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::HttpRequest(e));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.text().await {
                    Ok(b) => b,
                    Err(e) => {
                        last_error = Some(LlmError::HttpRequest(e));
                        continue;
                    },
                };

                let chat_response: ChatResponse =
                    serde_json::from_str(&body).map_err(|e| LlmError::JsonParse {
                        context: format!(
                            "chat completion response (body: {})",
                            truncate(&body, 200)
                        ),
                        source: e,
                    })?;

                return chat_response
                    .choices
                    .into_iter()
                    .next()
                    .map(|choice| choice.message)
                    .ok_or(LlmError::EmptyResponse);
            }

            let status_code = status.as_u16();
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());

            let err = LlmError::HttpStatus { code: status_code, body };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(LlmError::RetriesExhausted(Box::new(last_error.unwrap_or(LlmError::EmptyResponse))))
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}

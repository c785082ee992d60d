use std::time::Duration;

use isp_chat_core::env_config::{env_parse_with_default, env_string};

/// Default root of the ISP billing API.
pub const DEFAULT_BASE_URL: &str = "https://isppaybd.com/api";
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Extra time granted to ticket creation on top of the request timeout.
pub const TICKET_TIMEOUT_EXTRA_SECS: u64 = 5;

/// Connection settings for [`crate::IspClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IspConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for IspConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl IspConfig {
    /// Read `ISP_API_BASE_URL` and `ISP_API_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("ISP_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: Duration::from_secs(env_parse_with_default(
                "ISP_API_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) fn ticket_timeout(&self) -> Duration {
        self.timeout.saturating_add(Duration::from_secs(TICKET_TIMEOUT_EXTRA_SECS))
    }
}

use std::time::Duration;

use serde_json::Value;

use crate::config::IspConfig;
use crate::error::IspError;
use crate::types::{ConnectivityReport, MovieServers, SubscriptionOverview, TicketRequest, UserDetails};

/// Client for the ISP billing API.
#[derive(Debug, Clone)]
pub struct IspClient {
    client: reqwest::Client,
    config: IspConfig,
}

impl IspClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(config: IspConfig) -> Result<Self, IspError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IspError::ClientInit(e.to_string()))?;
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        Ok(Self { client, config: IspConfig { base_url, ..config } })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn get_json(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<Value>, IspError> {
        let url = format!("{}/{path}", self.config.base_url);
        tracing::debug!(%url, "ISP API request");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "ISP API returned error status");
            if status == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            return Err(IspError::HttpStatus { endpoint, code: status.as_u16() });
        }
        let body = response.text().await?;
        let value = serde_json::from_str(&body)
            .map_err(|source| IspError::JsonParse { context: endpoint, source })?;
        Ok(Some(value))
    }

    /// Look up an account. `None` when the API does not know the user.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-404 error status, or a malformed body.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserDetails>, IspError> {
        let Some(body) = self.get_json("users", &format!("users/{user_id}"), &[]).await? else {
            return Ok(None);
        };
        Ok(Some(UserDetails::from_api(&body)))
    }

    /// Diagnose a user's connection from their subscription, account and link status.
    ///
    /// # Errors
    /// Returns `UserNotFound` for unknown users, otherwise as [`Self::get_user`].
    pub async fn check_internet_status(
        &self,
        user_id: &str,
    ) -> Result<ConnectivityReport, IspError> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| IspError::UserNotFound(user_id.to_owned()))?;
        let report = ConnectivityReport::from_user(&user);
        tracing::info!(
            user_id,
            conn_status = %report.conn_status,
            issues = report.issues.len(),
            "Checked internet status"
        );
        Ok(report)
    }

    /// Current package and available alternatives.
    ///
    /// # Errors
    /// Returns an error on transport failure, an error status, or a malformed body.
    pub async fn get_subscription_packages(
        &self,
        user_id: &str,
    ) -> Result<SubscriptionOverview, IspError> {
        let body = self
            .get_json("subscription_index", "subscription_index", &[("role", "user"), ("user_id", user_id)])
            .await?
            .ok_or_else(|| IspError::Unavailable("Could not fetch subscription information".to_owned()))?;
        Ok(SubscriptionOverview::from_api(&body))
    }

    /// FTP and OTT movie servers available to the user.
    ///
    /// # Errors
    /// Returns `Unavailable` when the API reports no servers.
    pub async fn get_movie_servers(&self, user_id: &str) -> Result<MovieServers, IspError> {
        let body = self
            .get_json("movieservers", "movieservers", &[("user_id", user_id)])
            .await?
            .ok_or_else(|| IspError::Unavailable("Could not fetch servers".to_owned()))?;
        if body.get("status").and_then(Value::as_str) != Some("success") {
            return Err(IspError::Unavailable("No servers found".to_owned()));
        }
        let servers = body.get("data").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);
        let result = MovieServers::from_servers(servers);
        tracing::info!(
            user_id,
            ftp = result.ftp_servers.len(),
            ott = result.ott_servers.len(),
            "Fetched movie servers"
        );
        Ok(result)
    }

    /// Open a support ticket. Returns the API's JSON answer, or a generic
    /// success object when the body is not JSON.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn create_ticket(&self, ticket: &TicketRequest) -> Result<Value, IspError> {
        let message = ticket.formatted_message();
        let response = self
            .client
            .post(format!("{}/create_ticket", self.config.base_url))
            .query(&[
                ("user_id", ticket.user_id.as_str()),
                ("subject", ticket.subject.as_str()),
                ("category", ticket.category.as_str()),
                ("priority", ticket.priority.as_str()),
                ("message", message.as_str()),
            ])
            .timeout(self.ticket_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(user_id = %ticket.user_id, status = status.as_u16(), "Ticket creation failed");
            return Err(IspError::HttpStatus { endpoint: "create_ticket", code: status.as_u16() });
        }
        tracing::info!(user_id = %ticket.user_id, subject = %ticket.subject, "Created support ticket");
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| {
            serde_json::json!({"status": "success", "message": "Ticket created successfully"})
        }))
    }

    fn ticket_timeout(&self) -> Duration {
        self.config.ticket_timeout()
    }
}

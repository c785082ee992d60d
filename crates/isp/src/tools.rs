//! The ISP operations exposed to the language model as callable tools.
//!
//! Every tool result is a JSON object carrying `status: success|error`, so a
//! failed lookup still reaches the model as a structured answer.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::client::IspClient;
use crate::error::IspError;
use crate::types::{TicketRequest, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IspTool {
    SearchUser,
    CheckConnectivity,
    ViewPackages,
    ViewMovieServers,
    CreateTicket,
}

impl IspTool {
    pub const ALL: [Self; 5] = [
        Self::SearchUser,
        Self::CheckConnectivity,
        Self::ViewPackages,
        Self::ViewMovieServers,
        Self::CreateTicket,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SearchUser => "search_user_by_id",
            Self::CheckConnectivity => "check_internet_connectivity",
            Self::ViewPackages => "view_packages",
            Self::ViewMovieServers => "view_movie_servers",
            Self::CreateTicket => "create_ticket",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SearchUser => {
                "Fetch account details by user ID: subscription, account and connection status, \
                 billing and expiry. Use when the user asks about their account or bill."
            },
            Self::CheckConnectivity => {
                "Check internet connectivity and get troubleshooting recommendations. Use first \
                 whenever the user reports no internet, slow internet or connection problems."
            },
            Self::ViewPackages => {
                "Show the user's current package and all available packages with speed and price. \
                 Use for questions about plans, pricing or upgrades."
            },
            Self::ViewMovieServers => {
                "List available FTP movie servers and OTT platforms with their URLs."
            },
            Self::CreateTicket => {
                "Create a priority support ticket for the support team. Only call after the user \
                 agreed to escalate; infer subject, category and priority from the conversation."
            },
        }
    }

    /// JSON Schema of the tool's arguments.
    #[must_use]
    pub fn parameters(self) -> Value {
        let user_id = json!({"type": "string", "description": "The user ID, e.g. \"10854\""});
        match self {
            Self::CreateTicket => json!({
                "type": "object",
                "properties": {
                    "user_id": user_id,
                    "subject": {"type": "string", "description": "Short summary of the problem"},
                    "category": {"type": "string", "description": "e.g. technical, billing, account"},
                    "priority": {"type": "string", "enum": ["low", "medium", "high"]},
                    "message": {"type": "string", "description": "Details of the user's issue"}
                },
                "required": ["user_id", "subject", "category", "priority", "message"]
            }),
            _ => json!({
                "type": "object",
                "properties": {"user_id": user_id},
                "required": ["user_id"]
            }),
        }
    }
}

impl std::fmt::Display for IspTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn required(args: &Value, key: &'static str) -> Result<String, IspError> {
    text(args, key).filter(|v| !v.trim().is_empty()).ok_or(IspError::MissingArgument(key))
}

/// Tag a serializable result with `status: success`.
fn success<T: Serialize>(result: &T) -> Value {
    let mut object = match serde_json::to_value(result) {
        Ok(Value::Object(map)) => map,
        Ok(other) => Map::from_iter([("result".to_owned(), other)]),
        Err(e) => return failure(&format!("Error: {e}")),
    };
    object.entry("status").or_insert_with(|| Value::from("success"));
    Value::Object(object)
}

fn failure(message: &str) -> Value {
    json!({"status": "error", "message": message})
}

impl IspClient {
    /// Execute `tool` with model-supplied `args`; never fails.
    pub async fn run_tool(&self, tool: IspTool, args: &Value) -> Value {
        let outcome = self.dispatch(tool, args).await;
        match outcome {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(tool = %tool, error = %err, "ISP tool call failed");
                failure(&err.tool_message())
            },
        }
    }

    async fn dispatch(&self, tool: IspTool, args: &Value) -> Result<Value, IspError> {
        let user_id = required(args, "user_id")?;
        match tool {
            IspTool::SearchUser => match self.get_user(&user_id).await? {
                Some(user) => Ok(success(&user)),
                None => Err(IspError::UserNotFound(user_id)),
            },
            IspTool::CheckConnectivity => Ok(success(&self.check_internet_status(&user_id).await?)),
            IspTool::ViewPackages => Ok(success(&self.get_subscription_packages(&user_id).await?)),
            IspTool::ViewMovieServers => Ok(success(&self.get_movie_servers(&user_id).await?)),
            IspTool::CreateTicket => {
                let ticket = TicketRequest {
                    user_id,
                    subject: required(args, "subject")?,
                    category: required(args, "category")?,
                    priority: required(args, "priority")?,
                    message: required(args, "message")?,
                };
                Ok(success(&self.create_ticket(&ticket).await?))
            },
        }
    }
}

//! Shapes returned by the ISP billing API, normalized for the assistant.
//!
//! The upstream API is loosely typed (ids arrive as numbers or strings), so
//! records are read field by field from `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read `key` as text, accepting strings, numbers and booleans.
pub(crate) fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_or(value: &Value, key: &str, default: Value) -> Value {
    value.get(key).filter(|v| !v.is_null()).cloned().unwrap_or(default)
}

/// Account record from `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub pppoe: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub package_id: Option<String>,
    /// Subscription validity (`active` / `inactive`).
    pub subscription_status: Option<String>,
    /// Account state (`active` / `inactive`).
    pub account_status: Option<String>,
    /// Live connectivity (`conn` / `disconn`).
    pub conn_status: Option<String>,
    pub role: Option<String>,
    pub last_renewed: Option<String>,
    pub will_expire: Option<String>,
    pub payment_received: Value,
    pub payment_pending: Value,
    pub fund: String,
    pub router_id: Option<String>,
    pub area_id: Option<String>,
    pub auto_disconnect: Option<String>,
    pub total_support_ticket: Value,
    pub statistics: Value,
    pub full_details: Value,
}

impl UserDetails {
    /// Flatten the API envelope: account fields live under `details`, billing
    /// totals at the top level.
    #[must_use]
    pub fn from_api(body: &Value) -> Self {
        let details = body.get("details").cloned().unwrap_or_else(|| Value::Object(Default::default()));
        Self {
            user_id: text(&details, "id"),
            name: text(&details, "name"),
            pppoe: text(body, "pppoe"),
            mobile: text(&details, "mobile"),
            email: text(&details, "email"),
            address: text(&details, "address"),
            package_id: text(&details, "package_id"),
            subscription_status: text(&details, "subscription_status"),
            account_status: text(&details, "status"),
            conn_status: text(&details, "conn_status"),
            role: text(&details, "role"),
            last_renewed: text(&details, "last_renewed"),
            will_expire: text(&details, "will_expire"),
            payment_received: field_or(body, "payment_received", Value::from(0)),
            payment_pending: field_or(body, "payment_pending", Value::from(0)),
            fund: text(&details, "fund").unwrap_or_else(|| "0.00".to_owned()),
            router_id: text(&details, "router_id"),
            area_id: text(&details, "area_id"),
            auto_disconnect: text(&details, "auto_disconnect"),
            total_support_ticket: field_or(body, "total_support_ticket", Value::from(0)),
            statistics: field_or(body, "statistics", Value::Object(Default::default())),
            full_details: details,
        }
    }
}

/// Troubleshooting summary for a user's connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub user_name: Option<String>,
    pub subscription_status: String,
    pub account_status: String,
    pub conn_status: String,
    pub payment_pending: Value,
    pub will_expire: Option<String>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

pub const ROUTER_RESTART_STEPS: &str = "**Router Restart Steps:**\n\
1. Unplug the router power cable\n\
2. Wait for 30 seconds\n\
3. Plug the router back in\n\
4. Wait 2-3 minutes for it to fully boot up\n\
5. Check if internet is working";

impl ConnectivityReport {
    /// Derive issues and recommendations from the three status fields.
    #[must_use]
    pub fn from_user(user: &UserDetails) -> Self {
        let lower = |v: &Option<String>| v.as_deref().unwrap_or_default().to_lowercase();
        let subscription_status = lower(&user.subscription_status);
        let account_status = lower(&user.account_status);
        let conn_status = lower(&user.conn_status);

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        if subscription_status != "active" {
            issues.push(format!("Subscription is {subscription_status}"));
            recommendations
                .push("Please renew your subscription to restore internet access".to_owned());
        }
        if account_status != "active" {
            issues.push(format!("Account is {account_status}"));
            recommendations.push("Please contact support to activate your account".to_owned());
        }
        if conn_status != "conn" {
            issues.push(format!("Internet connection is {conn_status}"));
            recommendations.push("Try restarting your router for 30 seconds".to_owned());
            if subscription_status == "active" && account_status == "active" {
                recommendations.push(ROUTER_RESTART_STEPS.to_owned());
            }
        }
        if issues.is_empty() {
            issues.push("No issues detected".to_owned());
        }
        if recommendations.is_empty() {
            recommendations.push("Your internet connection appears to be working normally".to_owned());
        }

        Self {
            user_name: user.name.clone(),
            subscription_status,
            account_status,
            conn_status,
            payment_pending: user.payment_pending.clone(),
            will_expire: user.will_expire.clone(),
            issues,
            recommendations,
        }
    }
}

/// One internet package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub name: String,
    pub bandwidth: String,
    pub price: String,
    pub pricing_type: String,
}

impl PackageSummary {
    fn from_api(pkg: &Value) -> Self {
        Self {
            name: text(pkg, "package_name").unwrap_or_default(),
            bandwidth: text(pkg, "bandwidth").unwrap_or_default(),
            price: text(pkg, "price").unwrap_or_default(),
            pricing_type: text(pkg, "pricing_type").unwrap_or_default(),
        }
    }

    fn unknown() -> Self {
        Self {
            name: "Unknown".to_owned(),
            bandwidth: "Unknown".to_owned(),
            price: "0".to_owned(),
            pricing_type: "monthly".to_owned(),
        }
    }
}

/// Current package plus the packages a user may switch to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    pub user_name: Option<String>,
    pub current_package: PackageSummary,
    pub subscription_status: Option<String>,
    pub will_expire: Option<String>,
    pub last_renewed: Option<String>,
    pub available_packages: Vec<PackageSummary>,
}

impl SubscriptionOverview {
    /// Split the package list into the user's current package and the
    /// active, visible alternatives.
    #[must_use]
    pub fn from_api(body: &Value) -> Self {
        let details = body.get("details").cloned().unwrap_or(Value::Null);
        let current_id = text(&details, "package_id");
        let packages = body.get("packages").and_then(Value::as_array).map_or(&[][..], Vec::as_slice);

        let mut current = None;
        let mut available = Vec::new();
        for pkg in packages {
            if current_id.is_some() && text(pkg, "id") == current_id {
                current = Some(PackageSummary::from_api(pkg));
            } else if text(pkg, "status").as_deref() == Some("active")
                && text(pkg, "visibility").as_deref() == Some("active")
            {
                available.push(PackageSummary::from_api(pkg));
            }
        }

        Self {
            user_name: text(&details, "name"),
            current_package: current.unwrap_or_else(PackageSummary::unknown),
            subscription_status: text(&details, "subscription_status"),
            will_expire: text(&details, "will_expire"),
            last_renewed: text(&details, "last_renewed"),
            available_packages: available,
        }
    }
}

/// Movie servers grouped by kind, each rendered as `name: url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieServers {
    pub total: usize,
    pub ftp_servers: Vec<String>,
    pub ott_servers: Vec<String>,
}

impl MovieServers {
    #[must_use]
    pub fn from_servers(servers: &[Value]) -> Self {
        let mut ftp_servers = Vec::new();
        let mut ott_servers = Vec::new();
        for server in servers {
            let entry = format!(
                "{}: {}",
                text(server, "name").unwrap_or_default(),
                text(server, "url").unwrap_or_default()
            );
            if text(server, "details").as_deref() == Some("OTT") {
                ott_servers.push(entry);
            } else {
                ftp_servers.push(entry);
            }
        }
        Self { total: servers.len(), ftp_servers, ott_servers }
    }
}

/// Support ticket to open on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub user_id: String,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub message: String,
}

impl TicketRequest {
    /// The message as submitted: attributed to the assistant and the user.
    #[must_use]
    pub fn formatted_message(&self) -> String {
        format!(
            "Ticket created by AI Assistant for User {}.\n\nUser Issue: {}",
            self.user_id, self.message
        )
    }
}

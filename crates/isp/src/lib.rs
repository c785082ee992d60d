//! Client for the ISP billing API used by the support assistant.
//!
//! Account lookup, connectivity diagnosis, package listing, movie servers and
//! ticket creation, plus the [`IspTool`] catalogue the model can call.

mod client;
#[cfg(test)]
mod client_tests;
mod config;
mod error;
mod tools;
mod types;

pub use client::IspClient;
pub use config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, IspConfig};
pub use error::IspError;
pub use tools::IspTool;
pub use types::{
    ConnectivityReport, MovieServers, PackageSummary, ROUTER_RESTART_STEPS, SubscriptionOverview,
    TicketRequest, UserDetails,
};

//! Response types (Serialize)

use isp_chat_core::{DailyStatistics, Message, Page};
use isp_chat_storage::{DeleteUserResult, TableCounts};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub user_id: String,
    #[serde(flatten)]
    pub deleted: DeleteUserResult,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub success: bool,
    /// Row counts before the purge.
    pub deleted: TableCounts,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub statistics: Vec<DailyStatistics>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_term: String,
    #[serde(flatten)]
    pub page: Page<Message>,
}

use async_trait::async_trait;
use isp_chat_core::DailyStatistics;

use crate::error::StorageError;
use crate::types::{DeleteUserResult, StatsQuery, TableCounts};

/// Daily statistics and bulk maintenance.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Buckets matching `query`, newest date first.
    async fn daily_statistics(
        &self,
        query: &StatsQuery,
    ) -> Result<Vec<DailyStatistics>, StorageError>;

    /// Row counts of every table.
    async fn table_counts(&self) -> Result<TableCounts, StorageError>;

    /// Delete every conversation of a user (or of all anonymous sessions) and
    /// that user's statistics buckets.
    async fn delete_user_data(&self, user_id: &str) -> Result<DeleteUserResult, StorageError>;

    /// Delete everything. Returns the counts as they were before deletion.
    async fn purge_all(&self) -> Result<TableCounts, StorageError>;
}

#![allow(clippy::unwrap_used, reason = "test code")]

use std::sync::Arc;

use isp_chat_storage::StorageBackend;
use tempfile::TempDir;

pub(crate) fn create_test_backend() -> (Arc<StorageBackend>, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("chat_history.db");
    let storage = StorageBackend::new_sqlite(&db_path, 4).unwrap();
    (Arc::new(storage), dir)
}

//! Test utilities and module declarations for storage tests.

#![allow(clippy::unwrap_used, reason = "test code")]

use crate::Storage;
use isp_chat_core::{Conversation, Message, MessageLevel, NewConversation, NewMessage};
use tempfile::TempDir;

pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = Storage::new(&db_path, 4).unwrap();
    (storage, temp_dir)
}

pub fn start_conversation(storage: &Storage, user_id: Option<&str>) -> Conversation {
    storage
        .create_conversation(&NewConversation::new(user_id.map(str::to_owned), "EN"))
        .unwrap()
}

pub fn say(storage: &Storage, conversation_id: &str, content: &str) -> Message {
    storage.append_message(&NewMessage::user(conversation_id, content).tokens_used(2)).unwrap()
}

pub fn reply(storage: &Storage, conversation_id: &str, content: &str, response_ms: f64) -> Message {
    storage
        .append_message(
            &NewMessage::assistant(conversation_id, content)
                .classified(MessageLevel::Mid, Some("billing".to_owned()))
                .tokens_used(5)
                .response_time_ms(response_ms)
                .tools_used(vec!["get_invoices".to_owned()])
                .api_calls_made(1),
        )
        .unwrap()
}

mod concurrency_tests;
mod stats_tests;

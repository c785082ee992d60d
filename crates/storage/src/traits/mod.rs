//! Storage backend trait abstraction
//!
//! Async domain traits implemented by the SQLite and PostgreSQL backends.

pub mod conversation;
pub mod message;
pub mod query;
pub mod stats;

pub use conversation::ConversationStore;
pub use message::MessageStore;
pub use query::QueryStore;
pub use stats::StatsStore;

/// Everything the chat service and history API need from a backend.
pub trait ChatStore: ConversationStore + MessageStore + StatsStore + QueryStore {}

impl<T> ChatStore for T where T: ConversationStore + MessageStore + StatsStore + QueryStore {}

//! Domain types and pure logic for the ISP support chat backend.
//!
//! This crate holds everything that does not touch I/O: conversation and
//! message records, the keyword classifier, the model-output parser, daily
//! statistics arithmetic and the pagination envelope.

pub mod classifier;
pub mod constants;
mod conversation;
pub mod env_config;
mod error;
mod filters;
pub mod json_utils;
mod message;
mod pagination;
pub mod reply_parser;
mod statistics;

pub use classifier::{Classification, classify, contains_user_data};
pub use conversation::*;
pub use error::*;
pub use filters::*;
pub use message::*;
pub use pagination::*;
pub use reply_parser::{ParseOutcome, ParseStrategy, ReplyMetadata, parse_reply};
pub use statistics::*;

//! Messaging domain - direct messages grouped into pair conversations

pub mod data;
pub mod models;

pub use data::{ConversationSummary, MessageData};
pub use models::{conversation_key, Message};

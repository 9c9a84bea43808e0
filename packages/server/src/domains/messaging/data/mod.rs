//! API data types for messaging.

use serde::Serialize;

use crate::domains::messaging::models::Message;
use crate::domains::users::data::UserSummary;

/// One message as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct MessageData {
    pub id: String,
    pub sender: UserSummary,
    pub receiver: UserSummary,
    pub body: String,
    pub read: bool,
    pub conversation_key: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MessageData {
    pub fn from_message(message: Message, sender: UserSummary, receiver: UserSummary) -> Self {
        Self {
            id: message.id.to_string(),
            sender,
            receiver,
            body: message.body,
            read: message.read,
            conversation_key: message.conversation_key,
            created_at: message.created_at,
        }
    }
}

/// Conversation list entry: the counterpart, the latest message and how many
/// are still unread.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_key: String,
    pub other_user: UserSummary,
    pub last_message: MessageData,
    pub unread_count: i64,
}

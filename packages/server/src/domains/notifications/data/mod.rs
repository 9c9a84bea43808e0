//! API data types for notifications.

use serde::Serialize;

use crate::domains::notifications::models::Notification;
use crate::domains::users::data::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct NotificationData {
    pub id: String,
    pub actor: UserSummary,
    pub kind: String,
    pub post_id: Option<String>,
    pub plant_id: Option<String>,
    pub comment_id: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl NotificationData {
    pub fn from_notification(notification: Notification, actor: UserSummary) -> Self {
        Self {
            id: notification.id.to_string(),
            actor,
            kind: notification.kind,
            post_id: notification.post_id.map(|id| id.to_string()),
            plant_id: notification.plant_id.map(|id| id.to_string()),
            comment_id: notification.comment_id.map(|id| id.to_string()),
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

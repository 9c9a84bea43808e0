//! Notifications domain - in-app notification records
//!
//! Only record creation lives here; delivery (push, email) is out of scope.

pub mod data;
pub mod models;

pub use data::NotificationData;
pub use models::{Notification, NotificationKind};

//! Users domain - profiles, follow graph, blocking

pub mod actions;
pub mod data;
pub mod models;

pub use data::{UserProfile, UserSummary};
pub use models::User;

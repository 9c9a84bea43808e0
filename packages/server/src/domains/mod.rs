// Business domains
pub mod adoption;
pub mod auth;
pub mod messaging;
pub mod notifications;
pub mod plants;
pub mod posts;
pub mod users;

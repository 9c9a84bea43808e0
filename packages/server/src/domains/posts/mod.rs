//! Posts domain - plant photo posts, likes, comments, discovery

pub mod actions;
pub mod data;
pub mod models;

pub use data::{CommentData, PostData};
pub use models::Post;

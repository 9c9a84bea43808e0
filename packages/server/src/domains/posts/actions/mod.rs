pub mod create_post;
pub mod engage;

pub use create_post::{create_post, CreatePostInput, UploadedImage};
pub use engage::{add_comment, toggle_like, LikeToggle};

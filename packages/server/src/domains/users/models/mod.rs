pub mod block;
pub mod follow;
pub mod user;

pub use block::Block;
pub use follow::Follow;
pub use user::{is_valid_username, ProfileUpdate, User};

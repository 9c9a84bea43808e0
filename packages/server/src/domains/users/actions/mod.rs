pub mod block_user;
pub mod follow_user;

pub use block_user::{block_user, unblock_user};
pub use follow_user::{toggle_follow, FollowToggle};

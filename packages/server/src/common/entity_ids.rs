//! Typed ID aliases for all domain entities.
//!
//! IDs with different marker types are incompatible, so mixing up e.g. a
//! `UserId` and a `PostId` is a compile error.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for User entities.
pub struct User;

/// Marker type for Post entities (photo posts, may carry adoption state).
pub struct Post;

/// Marker type for standalone Plant listings.
pub struct Plant;

/// Marker type for post comments.
pub struct Comment;

/// Marker type for direct messages.
pub struct Message;

/// Marker type for notification records.
pub struct Notification;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type PostId = Id<Post>;
pub type PlantId = Id<Plant>;
pub type CommentId = Id<Comment>;
pub type MessageId = Id<Message>;
pub type NotificationId = Id<Notification>;

//! API data types for users.

use serde::{Deserialize, Serialize};

use crate::domains::users::models::User;

/// Compact user representation embedded in posts, comments, messages and
/// notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    pub profile_picture: Option<String>,
    pub is_verified: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            profile_picture: user.profile_picture.clone(),
            is_verified: user.is_verified,
        }
    }
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        (&user).into()
    }
}

/// Full profile representation with social counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub location_name: Option<String>,
    pub website: Option<String>,
    pub is_private: bool,
    pub is_verified: bool,
    pub follower_count: i64,
    pub following_count: i64,
    pub post_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserProfile {
    pub fn from_user(user: User, follower_count: i64, following_count: i64, post_count: i64) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            name: user.name,
            bio: user.bio,
            profile_picture: user.profile_picture,
            location_name: user.location_name,
            website: user.website,
            is_private: user.is_private,
            is_verified: user.is_verified,
            follower_count,
            following_count,
            post_count,
            created_at: user.created_at,
        }
    }
}

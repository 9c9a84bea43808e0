use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// User model - SQL persistence layer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub location_name: Option<String>,
    pub website: Option<String>,
    pub is_private: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub location_name: Option<String>,
    pub website: Option<String>,
    pub profile_picture: Option<String>,
}

/// Usernames are lowercase alphanumerics and underscores, at least 3 chars.
pub fn is_valid_username(username: &str) -> bool {
    username.len() >= 3
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by username
    pub async fn find_by_username(username: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find several users by ID (for assembling notification/conversation lists)
    pub async fn find_by_ids(ids: &[UserId], pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// Check whether a username is taken, optionally ignoring one user
    /// (profile edits keeping the current name).
    pub async fn username_taken(
        username: &str,
        exclude: Option<UserId>,
        pool: &PgPool,
    ) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert new user
    pub async fn insert(username: &str, name: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (id, username, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(username)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Apply a profile update
    pub async fn update_profile(id: UserId, update: &ProfileUpdate, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                bio = COALESCE($4, bio),
                location_name = COALESCE($5, location_name),
                website = COALESCE($6, website),
                profile_picture = COALESCE($7, profile_picture),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.username)
        .bind(&update.bio)
        .bind(&update.location_name)
        .bind(&update.website)
        .bind(&update.profile_picture)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Search users by username, name or bio
    pub async fn search(query: &str, limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let pattern = format!("%{}%", query);
        sqlx::query_as::<_, Self>(
            r#"
            SELECT u.* FROM users u
            WHERE u.username ILIKE $1 OR u.name ILIKE $1 OR u.bio ILIKE $1
            ORDER BY (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Suggested accounts to follow: not yet followed, not the caller,
    /// most-followed first.
    pub async fn suggestions(for_user: UserId, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT u.* FROM users u
            WHERE u.id <> $1
              AND NOT EXISTS(
                  SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.followee_id = u.id
              )
              AND NOT EXISTS(
                  SELECT 1 FROM blocks b
                  WHERE (b.blocker_id = $1 AND b.blocked_id = u.id)
                     OR (b.blocker_id = u.id AND b.blocked_id = $1)
              )
            ORDER BY (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id) DESC,
                     u.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(for_user)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn follower_count(id: UserId, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn following_count(id: UserId, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn post_count(id: UserId, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE author_id = $1 AND is_public",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_validation() {
        assert!(is_valid_username("fern_friend"));
        assert!(is_valid_username("moss42"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("Fern"));
        assert!(!is_valid_username("fern friend"));
        assert!(!is_valid_username("fern-friend"));
    }
}

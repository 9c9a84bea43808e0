use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

use super::user::User;

/// Follow edge - follower watches followee's posts in their feed
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub async fn exists(follower: UserId, followee: UserId, pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower)
        .bind(followee)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(follower: UserId, followee: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower)
        .bind(followee)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(follower: UserId, followee: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower)
            .bind(followee)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove the edges in both directions between two users (blocking).
    pub async fn sever(a: UserId, b: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM follows
            WHERE (follower_id = $1 AND followee_id = $2)
               OR (follower_id = $2 AND followee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Users following `of`, most recent first.
    pub async fn followers_of(
        of: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN follows f ON f.follower_id = u.id
            WHERE f.followee_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(of)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Users that `of` follows, most recent first.
    pub async fn following_of(
        of: UserId,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN follows f ON f.followee_id = u.id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(of)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// IDs of everyone `of` follows (feed author set).
    pub async fn followee_ids(of: UserId, pool: &PgPool) -> Result<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT followee_id FROM follows WHERE follower_id = $1")
            .bind(of)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}

use anyhow::Result;
use sqlx::PgPool;

use crate::common::{PostId, UserId};

/// Like edge between a user and a post.
pub struct Like;

impl Like {
    pub async fn exists(post: PostId, user: UserId, pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post)
        .bind(user)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(post: PostId, user: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post)
        .bind(user)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(post: PostId, user: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
            .bind(post)
            .bind(user)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn count(post: PostId, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }
}

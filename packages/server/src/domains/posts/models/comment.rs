use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CommentId, PostId, UserId};

/// Longest accepted comment body.
pub const MAX_COMMENT_LENGTH: usize = 200;

/// Comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub async fn create(
        post_id: PostId,
        author_id: UserId,
        body: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, author_id, body)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(CommentId::new())
        .bind(post_id)
        .bind(author_id)
        .bind(body.trim())
        .fetch_one(pool)
        .await?;
        Ok(comment)
    }

    /// Comments on a post, oldest first.
    pub async fn find_by_post(post_id: PostId, pool: &PgPool) -> Result<Vec<Self>> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(pool)
        .await?;
        Ok(comments)
    }
}

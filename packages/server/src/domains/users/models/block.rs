use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

use super::user::User;

/// Block edge - blocker no longer sees or interacts with blocked
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Block {
    pub blocker_id: UserId,
    pub blocked_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Block {
    pub async fn exists(blocker: UserId, blocked: UserId, pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2)",
        )
        .bind(blocker)
        .bind(blocked)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create(blocker: UserId, blocked: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blocks (blocker_id, blocked_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(blocker)
        .bind(blocked)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn delete(blocker: UserId, blocked: UserId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker)
            .bind(blocked)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Everyone the user has blocked.
    pub async fn blocked_by(blocker: UserId, pool: &PgPool) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN blocks b ON b.blocked_id = u.id
            WHERE b.blocker_id = $1
            ORDER BY b.created_at DESC
            "#,
        )
        .bind(blocker)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

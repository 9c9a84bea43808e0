use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

use crate::common::{CommentId, NotificationId, PlantId, PostId, UserId};

/// Notification kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    AdoptionRequest,
    AdoptionAccepted,
    AdoptionRejected,
    AdoptionCancelled,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Like => write!(f, "like"),
            NotificationKind::Comment => write!(f, "comment"),
            NotificationKind::Follow => write!(f, "follow"),
            NotificationKind::AdoptionRequest => write!(f, "adoption_request"),
            NotificationKind::AdoptionAccepted => write!(f, "adoption_accepted"),
            NotificationKind::AdoptionRejected => write!(f, "adoption_rejected"),
            NotificationKind::AdoptionCancelled => write!(f, "adoption_cancelled"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "like" => Ok(NotificationKind::Like),
            "comment" => Ok(NotificationKind::Comment),
            "follow" => Ok(NotificationKind::Follow),
            "adoption_request" => Ok(NotificationKind::AdoptionRequest),
            "adoption_accepted" => Ok(NotificationKind::AdoptionAccepted),
            "adoption_rejected" => Ok(NotificationKind::AdoptionRejected),
            "adoption_cancelled" => Ok(NotificationKind::AdoptionCancelled),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}

/// Notification record: `user_id` receives it, `actor_id` caused it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub actor_id: UserId,
    pub kind: String,
    pub post_id: Option<PostId>,
    pub plant_id: Option<PlantId>,
    pub comment_id: Option<CommentId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub async fn create(
        user_id: UserId,
        actor_id: UserId,
        kind: NotificationKind,
        post_id: Option<PostId>,
        plant_id: Option<PlantId>,
        comment_id: Option<CommentId>,
        pool: &PgPool,
    ) -> Result<Self> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, actor_id, kind, post_id, plant_id, comment_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(NotificationId::new())
        .bind(user_id)
        .bind(actor_id)
        .bind(kind.to_string())
        .bind(post_id)
        .bind(plant_id)
        .bind(comment_id)
        .fetch_one(pool)
        .await?;
        Ok(notification)
    }

    /// Latest notifications for a user (most recent first, capped at 50).
    pub async fn list_for(user_id: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    pub async fn unread_count(user_id: UserId, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Mark one notification as read; scoped to the owning user.
    pub async fn mark_read(
        id: NotificationId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(notification)
    }

    pub async fn mark_all_read(user_id: UserId, pool: &PgPool) -> Result<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Remove the like notification when a post is unliked.
    pub async fn delete_like(
        user_id: UserId,
        actor_id: UserId,
        post_id: PostId,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query(
            "DELETE FROM notifications WHERE user_id = $1 AND actor_id = $2 AND kind = 'like' AND post_id = $3",
        )
        .bind(user_id)
        .bind(actor_id)
        .bind(post_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_roundtrip() {
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Follow,
            NotificationKind::AdoptionRequest,
            NotificationKind::AdoptionAccepted,
            NotificationKind::AdoptionRejected,
            NotificationKind::AdoptionCancelled,
        ] {
            assert_eq!(kind.to_string().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("mention".parse::<NotificationKind>().is_err());
    }
}

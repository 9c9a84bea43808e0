use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{MessageId, UserId};

/// Longest accepted message body.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

/// Direct message between two users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: String,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub conversation_key: String,
    pub created_at: DateTime<Utc>,
}

/// Direction-independent conversation identifier: the two user IDs sorted
/// and joined, so both directions of a pair collapse into one thread.
pub fn conversation_key(a: UserId, b: UserId) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", first, second)
}

impl Message {
    /// Send a message. The body is trimmed; empty bodies are the caller's
    /// responsibility to reject.
    pub async fn send(
        sender: UserId,
        receiver: UserId,
        body: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, body, conversation_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(MessageId::new())
        .bind(sender)
        .bind(receiver)
        .bind(body.trim())
        .bind(conversation_key(sender, receiver))
        .fetch_one(pool)
        .await?;
        Ok(message)
    }

    /// All messages of one conversation, oldest first.
    pub async fn find_by_conversation(key: &str, pool: &PgPool) -> Result<Vec<Self>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_key = $1 ORDER BY created_at",
        )
        .bind(key)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    /// Latest message per conversation the user participates in, newest
    /// conversation first.
    pub async fn latest_per_conversation(user: UserId, pool: &PgPool) -> Result<Vec<Self>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT DISTINCT ON (conversation_key) *
            FROM messages
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY conversation_key, created_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    /// Mark all messages of a conversation as read for the receiver.
    pub async fn mark_conversation_read(key: &str, receiver: UserId, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read = TRUE, read_at = NOW()
            WHERE conversation_key = $1 AND receiver_id = $2 AND read = FALSE
            "#,
        )
        .bind(key)
        .bind(receiver)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unread messages in one conversation for the receiver.
    pub async fn unread_in_conversation(key: &str, receiver: UserId, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE conversation_key = $1 AND receiver_id = $2 AND read = FALSE",
        )
        .bind(key)
        .bind(receiver)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Total unread messages for a user.
    pub async fn unread_total(receiver: UserId, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND read = FALSE",
        )
        .bind(receiver)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn conversation_key_is_direction_independent() {
        let a = UserId::from_uuid(Uuid::from_u128(7));
        let b = UserId::from_uuid(Uuid::from_u128(9));
        assert_eq!(conversation_key(a, b), conversation_key(b, a));
    }

    #[test]
    fn conversation_key_sorts_ids() {
        let a = UserId::from_uuid(Uuid::from_u128(7));
        let b = UserId::from_uuid(Uuid::from_u128(9));
        let key = conversation_key(b, a);
        assert_eq!(key, format!("{}_{}", a, b));
    }

    #[test]
    fn conversation_key_differs_per_pair() {
        let a = UserId::from_uuid(Uuid::from_u128(7));
        let b = UserId::from_uuid(Uuid::from_u128(9));
        let c = UserId::from_uuid(Uuid::from_u128(11));
        assert_ne!(conversation_key(a, b), conversation_key(a, c));
    }

    #[test]
    fn self_conversation_is_stable() {
        let a = UserId::from_uuid(Uuid::from_u128(7));
        assert_eq!(conversation_key(a, a), format!("{}_{}", a, a));
    }
}

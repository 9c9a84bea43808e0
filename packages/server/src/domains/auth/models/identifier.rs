use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::UserId;

/// Identifier - maps hashed emails or phone numbers to users
///
/// Raw identifiers are never stored; the SHA-256 hash is the lookup key.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identifier {
    pub id: Uuid,
    pub user_id: UserId,
    pub identifier_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Identifier {
    /// Find identifier by hash
    pub async fn find_by_hash(identifier_hash: &str, pool: &PgPool) -> Result<Option<Self>> {
        let identifier = sqlx::query_as::<_, Identifier>(
            "SELECT * FROM identifiers WHERE identifier_hash = $1",
        )
        .bind(identifier_hash)
        .fetch_optional(pool)
        .await?;
        Ok(identifier)
    }

    /// Create identifier for a user
    pub async fn create(
        user_id: UserId,
        identifier_hash: String,
        is_admin: bool,
        pool: &PgPool,
    ) -> Result<Self> {
        let identifier = sqlx::query_as::<_, Identifier>(
            r#"
            INSERT INTO identifiers (user_id, identifier_hash, is_admin)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(identifier_hash)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;
        Ok(identifier)
    }
}

/// Hash an identifier (email or phone number) using SHA-256.
///
/// Emails are lowercased before hashing so casing differences map to the
/// same account; phone numbers are hashed as given (E.164 expected).
pub fn hash_identifier(identifier: &str) -> String {
    let normalized = if identifier.contains('@') {
        identifier.trim().to_ascii_lowercase()
    } else {
        identifier.trim().to_string()
    };

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check if an identifier should be granted admin privileges.
///
/// Emails match case-insensitively, phone numbers exactly.
pub fn is_admin_identifier(identifier: &str, admin_identifiers: &[String]) -> bool {
    admin_identifiers.iter().any(|admin_id| {
        if identifier.contains('@') && admin_id.contains('@') {
            admin_id.eq_ignore_ascii_case(identifier)
        } else {
            admin_id == identifier
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(
            hash_identifier("moss@example.com"),
            hash_identifier("moss@example.com")
        );
        assert_ne!(
            hash_identifier("moss@example.com"),
            hash_identifier("ivy@example.com")
        );
    }

    #[test]
    fn hash_normalizes_email_case() {
        assert_eq!(
            hash_identifier("Moss@Example.COM"),
            hash_identifier("moss@example.com")
        );
    }

    #[test]
    fn hash_format_is_hex_sha256() {
        let hash = hash_identifier("+15551234567");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn admin_email_matches_case_insensitively() {
        let admins = vec!["Admin@Example.com".to_string()];
        assert!(is_admin_identifier("admin@example.com", &admins));
        assert!(is_admin_identifier("ADMIN@EXAMPLE.COM", &admins));
        assert!(!is_admin_identifier("user@example.com", &admins));
    }

    #[test]
    fn admin_phone_matches_exactly() {
        let admins = vec!["+15551234567".to_string()];
        assert!(is_admin_identifier("+15551234567", &admins));
        assert!(!is_admin_identifier("+15557654321", &admins));
    }
}

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::identifier::hash_identifier;

/// How long a one-time code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Pending one-time code, keyed by the hashed identifier. Only the code hash
/// is stored; verification re-hashes the submitted code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpCode {
    pub identifier_hash: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    /// Generate a 6-digit code (UUID v4 as the entropy source).
    pub fn generate_code() -> String {
        let entropy = u32::from_be_bytes(
            Uuid::new_v4().as_bytes()[..4]
                .try_into()
                .expect("uuid has at least 4 bytes"),
        );
        format!("{:06}", entropy % 1_000_000)
    }

    /// Store (or replace) the pending code for an identifier.
    pub async fn upsert(identifier_hash: &str, code: &str, pool: &PgPool) -> Result<()> {
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
        sqlx::query(
            r#"
            INSERT INTO otp_codes (identifier_hash, code_hash, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (identifier_hash) DO UPDATE
            SET code_hash = EXCLUDED.code_hash, expires_at = EXCLUDED.expires_at, created_at = NOW()
            "#,
        )
        .bind(identifier_hash)
        .bind(hash_identifier(code))
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Verify a submitted code. Consumes the pending code on success so each
    /// code is single-use.
    pub async fn verify_and_consume(
        identifier_hash: &str,
        code: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM otp_codes
            WHERE identifier_hash = $1
              AND code_hash = $2
              AND expires_at > NOW()
            "#,
        )
        .bind(identifier_hash)
        .bind(hash_identifier(code))
        .execute(pool)
        .await?;
        Ok(deleted.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = OtpCode::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}

//! Verify OTP action

use anyhow::Result;
use tracing::info;

use crate::domains::auth::models::{hash_identifier, is_admin_identifier, Identifier, OtpCode};
use crate::domains::users::models::{is_valid_username, User};
use crate::kernel::ServerDeps;

/// Result of verifying OTP
pub enum VerifyOtpOutcome {
    Verified { token: String, user: User },
    InvalidCode,
    UsernameRequired,
    InvalidUsername,
    UsernameTaken,
}

/// Verify a one-time code and sign the caller in.
///
/// First successful verification for an unknown identifier registers the
/// account, which requires a username. Returns a JWT on success.
pub async fn verify_otp(
    identifier: String,
    code: String,
    username: Option<String>,
    name: Option<String>,
    deps: &ServerDeps,
) -> Result<VerifyOtpOutcome> {
    let identifier_hash = hash_identifier(&identifier);

    if !OtpCode::verify_and_consume(&identifier_hash, &code, &deps.db_pool).await? {
        return Ok(VerifyOtpOutcome::InvalidCode);
    }

    let (user, is_admin) =
        match Identifier::find_by_hash(&identifier_hash, &deps.db_pool).await? {
            Some(existing) => {
                let user = User::find_by_id(existing.user_id, &deps.db_pool)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("identifier without user: {}", existing.id))?;
                (user, existing.is_admin)
            }
            None => {
                let Some(username) = username else {
                    return Ok(VerifyOtpOutcome::UsernameRequired);
                };
                if !is_valid_username(&username) {
                    return Ok(VerifyOtpOutcome::InvalidUsername);
                }
                if User::username_taken(&username, None, &deps.db_pool).await? {
                    return Ok(VerifyOtpOutcome::UsernameTaken);
                }

                let is_admin = is_admin_identifier(&identifier, &deps.admin_identifiers);
                let display_name = name.unwrap_or_else(|| username.clone());
                let user = User::insert(&username, &display_name, &deps.db_pool).await?;
                Identifier::create(user.id, identifier_hash, is_admin, &deps.db_pool).await?;
                info!(user_id = %user.id, "registered new user");
                (user, is_admin)
            }
        };

    let token =
        deps.jwt_service
            .create_token(user.id.into_uuid(), user.username.clone(), is_admin)?;

    info!(user_id = %user.id, "OTP verified");
    Ok(VerifyOtpOutcome::Verified { token, user })
}

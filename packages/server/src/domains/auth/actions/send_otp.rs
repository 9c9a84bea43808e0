//! Send OTP action

use anyhow::Result;
use tracing::info;

use crate::domains::auth::models::{hash_identifier, OtpCode};
use crate::kernel::ServerDeps;

/// Send a one-time code to an email address or phone number.
///
/// Sign-in and first-time registration share this flow: the code is stored
/// against the hashed identifier and the account is created on verification,
/// so unknown identifiers are not an error here.
pub async fn send_otp(identifier: String, deps: &ServerDeps) -> Result<()> {
    let identifier_hash = hash_identifier(&identifier);

    let code = OtpCode::generate_code();
    OtpCode::upsert(&identifier_hash, &code, &deps.db_pool).await?;

    deps.otp_sender.send_code(&identifier, &code).await?;

    info!("OTP sent");
    Ok(())
}

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::ApiError;
use crate::domains::auth::actions::{send_otp, verify_otp, VerifyOtpOutcome};
use crate::domains::users::data::UserProfile;
use crate::domains::users::models::User;
use crate::server::app::AppState;

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub identifier: String,
}

/// POST /api/auth/send-otp
pub async fn send_otp_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<SendOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let identifier = payload.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(ApiError::invalid("Identifier is required"));
    }

    send_otp(identifier, &state.deps)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({ "message": "Code sent" })))
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    pub code: String,
    pub username: Option<String>,
    pub name: Option<String>,
}

/// POST /api/auth/verify-otp
pub async fn verify_otp_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = verify_otp(
        payload.identifier.trim().to_string(),
        payload.code.trim().to_string(),
        payload.username,
        payload.name,
        &state.deps,
    )
    .await
    .map_err(ApiError::Internal)?;

    match outcome {
        VerifyOtpOutcome::Verified { token, user } => {
            let pool = &state.db_pool;
            let follower_count = User::follower_count(user.id, pool)
                .await
                .map_err(ApiError::Internal)?;
            let following_count = User::following_count(user.id, pool)
                .await
                .map_err(ApiError::Internal)?;
            let post_count = User::post_count(user.id, pool)
                .await
                .map_err(ApiError::Internal)?;
            let profile =
                UserProfile::from_user(user, follower_count, following_count, post_count);
            Ok(Json(json!({ "token": token, "user": profile })))
        }
        VerifyOtpOutcome::InvalidCode => Err(ApiError::forbidden("Invalid or expired code")),
        VerifyOtpOutcome::UsernameRequired => {
            Err(ApiError::invalid("Username is required for new accounts"))
        }
        VerifyOtpOutcome::InvalidUsername => Err(ApiError::invalid(
            "Username can only contain lowercase letters, numbers, and underscores",
        )),
        VerifyOtpOutcome::UsernameTaken => Err(ApiError::invalid("Username already taken")),
    }
}

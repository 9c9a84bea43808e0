// REST route handlers, one module per domain

pub mod adoptions;
pub mod auth;
pub mod health;
pub mod identify;
pub mod messages;
pub mod notifications;
pub mod plants;
pub mod posts;
pub mod users;

use std::collections::HashMap;

use sqlx::PgPool;

use crate::common::{ApiError, UserId};
use crate::domains::users::data::UserSummary;
use crate::domains::users::models::User;

/// Batch-load user summaries for response assembly (one query per list
/// endpoint instead of one per row).
pub(crate) async fn load_user_summaries(
    ids: &[UserId],
    pool: &PgPool,
) -> Result<HashMap<UserId, UserSummary>, ApiError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut unique: Vec<UserId> = ids.to_vec();
    unique.sort();
    unique.dedup();

    let users = User::find_by_ids(&unique, pool)
        .await
        .map_err(ApiError::Internal)?;

    Ok(users
        .into_iter()
        .map(|user| (user.id, UserSummary::from(&user)))
        .collect())
}

/// Placeholder summary for rows whose user has since been deleted.
pub(crate) fn unknown_user() -> UserSummary {
    UserSummary {
        id: UserId::nil().to_string(),
        username: "unknown".to_string(),
        name: "Unknown".to_string(),
        profile_picture: None,
        is_verified: false,
    }
}

//! Follow/unfollow action

use tracing::warn;

use crate::common::{ApiError, UserId};
use crate::domains::notifications::models::{Notification, NotificationKind};
use crate::domains::users::models::{Block, Follow, User};
use crate::kernel::ServerDeps;

/// Outcome of a follow toggle.
#[derive(Debug)]
pub struct FollowToggle {
    pub is_following: bool,
    pub follower_count: i64,
}

/// Toggle the follow edge from `actor` to `target`.
///
/// Following a user notifies them; unfollowing is silent. Blocked pairs
/// cannot follow each other.
pub async fn toggle_follow(
    actor: UserId,
    target: UserId,
    deps: &ServerDeps,
) -> Result<FollowToggle, ApiError> {
    if actor == target {
        return Err(ApiError::invalid("Cannot follow yourself"));
    }

    let pool = &deps.db_pool;

    if User::find_by_id(target, pool)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::not_found("User not found"));
    }

    let blocked = Block::exists(actor, target, pool)
        .await
        .map_err(ApiError::Internal)?
        || Block::exists(target, actor, pool)
            .await
            .map_err(ApiError::Internal)?;
    if blocked {
        return Err(ApiError::forbidden("Cannot follow this user"));
    }

    let is_following = Follow::exists(actor, target, pool)
        .await
        .map_err(ApiError::Internal)?;

    if is_following {
        Follow::delete(actor, target, pool)
            .await
            .map_err(ApiError::Internal)?;
    } else {
        Follow::create(actor, target, pool)
            .await
            .map_err(ApiError::Internal)?;

        // Best-effort: a failed notification never fails the follow
        if let Err(e) =
            Notification::create(target, actor, NotificationKind::Follow, None, None, None, pool)
                .await
        {
            warn!(error = %e, "follow notification failed");
        }
    }

    let follower_count = User::follower_count(target, pool)
        .await
        .map_err(ApiError::Internal)?;

    Ok(FollowToggle {
        is_following: !is_following,
        follower_count,
    })
}

//! Block/unblock actions

use crate::common::{ApiError, UserId};
use crate::domains::users::models::{Block, Follow, User};
use crate::kernel::ServerDeps;

/// Block a user. Severs the follow relationship in both directions.
pub async fn block_user(actor: UserId, target: UserId, deps: &ServerDeps) -> Result<(), ApiError> {
    if actor == target {
        return Err(ApiError::invalid("Cannot block yourself"));
    }

    let pool = &deps.db_pool;

    if User::find_by_id(target, pool)
        .await
        .map_err(ApiError::Internal)?
        .is_none()
    {
        return Err(ApiError::not_found("User not found"));
    }

    if Block::exists(actor, target, pool)
        .await
        .map_err(ApiError::Internal)?
    {
        return Err(ApiError::invalid("User is already blocked"));
    }

    Block::create(actor, target, pool)
        .await
        .map_err(ApiError::Internal)?;
    Follow::sever(actor, target, pool)
        .await
        .map_err(ApiError::Internal)?;

    Ok(())
}

/// Unblock a previously blocked user.
pub async fn unblock_user(
    actor: UserId,
    target: UserId,
    deps: &ServerDeps,
) -> Result<(), ApiError> {
    let removed = Block::delete(actor, target, &deps.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    if !removed {
        return Err(ApiError::invalid("User is not blocked"));
    }

    Ok(())
}

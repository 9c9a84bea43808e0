//! Like and comment actions

use tracing::warn;

use crate::common::{ApiError, PostId, UserId};
use crate::domains::notifications::models::{Notification, NotificationKind};
use crate::domains::posts::models::{Comment, Like, Post, MAX_COMMENT_LENGTH};
use crate::kernel::ServerDeps;

/// Outcome of a like toggle.
#[derive(Debug)]
pub struct LikeToggle {
    pub is_liked: bool,
    pub like_count: i64,
}

/// Toggle the caller's like on a post.
///
/// Liking notifies the author (unless self-liking); unliking removes that
/// notification again.
pub async fn toggle_like(
    actor: UserId,
    post_id: PostId,
    deps: &ServerDeps,
) -> Result<LikeToggle, ApiError> {
    let pool = &deps.db_pool;

    let post = Post::find_by_id(post_id, pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let is_liked = Like::exists(post_id, actor, pool)
        .await
        .map_err(ApiError::Internal)?;

    if is_liked {
        Like::delete(post_id, actor, pool)
            .await
            .map_err(ApiError::Internal)?;

        if let Err(e) = Notification::delete_like(post.author_id, actor, post_id, pool).await {
            warn!(error = %e, "like notification cleanup failed");
        }
    } else {
        Like::create(post_id, actor, pool)
            .await
            .map_err(ApiError::Internal)?;

        if actor != post.author_id {
            if let Err(e) = Notification::create(
                post.author_id,
                actor,
                NotificationKind::Like,
                Some(post_id),
                None,
                None,
                pool,
            )
            .await
            {
                warn!(error = %e, "like notification failed");
            }
        }
    }

    let like_count = Like::count(post_id, pool).await.map_err(ApiError::Internal)?;

    Ok(LikeToggle {
        is_liked: !is_liked,
        like_count,
    })
}

/// Add a comment to a post, notifying the author (unless self-commenting).
pub async fn add_comment(
    actor: UserId,
    post_id: PostId,
    text: &str,
    deps: &ServerDeps,
) -> Result<Comment, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::invalid("Comment text is required"));
    }
    if text.len() > MAX_COMMENT_LENGTH {
        return Err(ApiError::invalid("Comment is too long"));
    }

    let pool = &deps.db_pool;

    let post = Post::find_by_id(post_id, pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let comment = Comment::create(post_id, actor, text, pool)
        .await
        .map_err(ApiError::Internal)?;

    if actor != post.author_id {
        if let Err(e) = Notification::create(
            post.author_id,
            actor,
            NotificationKind::Comment,
            Some(post_id),
            None,
            Some(comment.id),
            pool,
        )
        .await
        {
            warn!(error = %e, "comment notification failed");
        }
    }

    Ok(comment)
}

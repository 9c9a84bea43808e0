use axum::extract::{Extension, Multipart, Path, Query};
use axum::Json;
use tracing::warn;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{ApiError, PageArgs, UserId};
use crate::domains::posts::data::PostData;
use crate::domains::posts::models::Post;
use crate::domains::users::actions::{block_user, toggle_follow, unblock_user};
use crate::domains::users::data::{UserProfile, UserSummary};
use crate::domains::users::models::{is_valid_username, Block, Follow, ProfileUpdate, User};
use crate::server::app::AppState;
use crate::server::middleware::{AuthUser, MaybeAuthUser};

async fn profile_of(user: User, state: &AppState) -> Result<UserProfile, ApiError> {
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
    Ok(UserProfile::from_user(
        user,
        follower_count,
        following_count,
        post_count,
    ))
}

/// GET /api/users/me
pub async fn me_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = User::find_by_id(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let profile = profile_of(user, &state).await?;
    Ok(Json(json!({ "user": profile })))
}

/// PUT /api/users/me
pub async fn update_me_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    if let Some(username) = &update.username {
        if !is_valid_username(username) {
            return Err(ApiError::invalid(
                "Username can only contain lowercase letters, numbers, and underscores",
            ));
        }
        if User::username_taken(username, Some(auth.user_id), &state.db_pool)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::invalid("Username already taken"));
        }
    }

    let user = User::update_profile(auth.user_id, &update, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let profile = profile_of(user, &state).await?;
    Ok(Json(json!({ "message": "Profile updated", "user": profile })))
}

const PROFILES_FOLDER: &str = "green-guard/profiles";

/// POST /api/users/upload-pfp
///
/// Replaces the caller's profile picture; the previous one is cleaned up
/// best-effort after the new URL is saved.
pub async fn upload_pfp_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut image: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default();
        if name == "profilePicture" || name == "profile_picture" || name == "image" {
            let file_name = field.file_name().unwrap_or("profile.jpg").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            if !content_type.starts_with("image/") {
                return Err(ApiError::invalid("Only image files are allowed"));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::invalid(format!("Failed to read image: {}", e)))?;
            image = Some((bytes.to_vec(), file_name, content_type));
        }
    }

    let Some((bytes, file_name, content_type)) = image else {
        return Err(ApiError::invalid("No image file provided"));
    };

    let user = User::find_by_id(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let url = state
        .deps
        .image_store
        .upload(bytes, &file_name, &content_type, PROFILES_FOLDER)
        .await
        .map_err(ApiError::Internal)?;

    let updated = User::update_profile(
        auth.user_id,
        &ProfileUpdate {
            profile_picture: Some(url.clone()),
            ..Default::default()
        },
        &state.db_pool,
    )
    .await
    .map_err(ApiError::Internal)?;

    // Old picture cleanup only after the new one is in place
    if let Some(old) = user.profile_picture.filter(|old| old != &url) {
        if let Err(e) = state.deps.image_store.delete(&old).await {
            warn!(url = %old, error = %e, "old profile picture cleanup failed");
        }
    }

    Ok(Json(json!({
        "message": "Profile picture uploaded successfully",
        "profilePicture": updated.profile_picture,
    })))
}

/// GET /api/users/profile/:username
pub async fn profile_handler(
    viewer: MaybeAuthUser,
    Path(username): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = User::find_by_username(&username, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let author_summary = UserSummary::from(&user);
    let posts = Post::by_author(user.id, viewer.user_id(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let posts: Vec<PostData> = posts
        .into_iter()
        .map(|meta| PostData::from_meta(meta, author_summary.clone()))
        .collect();

    let profile = profile_of(user, &state).await?;
    Ok(Json(json!({ "user": profile, "posts": posts })))
}

/// GET /api/users/check-username/:username
pub async fn check_username_handler(
    viewer: MaybeAuthUser,
    Path(username): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    if !is_valid_username(&username) {
        return Ok(Json(
            json!({ "available": false, "error": "Invalid username format" }),
        ));
    }

    let taken = User::username_taken(&username, viewer.user_id(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "available": !taken })))
}

/// POST /api/users/:id/follow
pub async fn follow_handler(
    auth: AuthUser,
    Path(user_id): Path<UserId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let toggle = toggle_follow(auth.user_id, user_id, &state.deps).await?;
    Ok(Json(json!({
        "message": if toggle.is_following { "Followed successfully" } else { "Unfollowed successfully" },
        "isFollowing": toggle.is_following,
        "followerCount": toggle.follower_count,
    })))
}

/// GET /api/users/:id/followers
pub async fn followers_handler(
    Path(user_id): Path<UserId>,
    Query(args): Query<PageArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let page = args.validate();
    let followers = Follow::followers_of(user_id, page.limit, page.offset(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let total = User::follower_count(user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let followers: Vec<UserSummary> = followers.iter().map(UserSummary::from).collect();
    Ok(Json(
        json!({ "followers": followers, "totalFollowers": total }),
    ))
}

/// GET /api/users/:id/following
pub async fn following_handler(
    Path(user_id): Path<UserId>,
    Query(args): Query<PageArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let page = args.validate();
    let following = Follow::following_of(user_id, page.limit, page.offset(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let total = User::following_count(user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let following: Vec<UserSummary> = following.iter().map(UserSummary::from).collect();
    Ok(Json(
        json!({ "following": following, "totalFollowing": total }),
    ))
}

#[derive(Deserialize)]
pub struct SearchArgs {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/users/search?q=
pub async fn search_handler(
    Query(args): Query<SearchArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let query = args.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::invalid("Search query is required"));
    }

    let page = PageArgs {
        page: args.page,
        limit: args.limit,
    }
    .validate();
    let users = User::search(query, page.limit, page.offset(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let has_more = users.len() as i64 == page.limit;
    let users: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    Ok(Json(json!({
        "users": users,
        "pagination": { "currentPage": page.page, "hasMore": has_more },
    })))
}

/// GET /api/users/suggestions
pub async fn suggestions_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let suggestions = User::suggestions(auth.user_id, 10, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let suggestions: Vec<UserSummary> = suggestions.iter().map(UserSummary::from).collect();
    Ok(Json(json!({ "suggestions": suggestions })))
}

/// POST /api/users/:id/block
pub async fn block_handler(
    auth: AuthUser,
    Path(user_id): Path<UserId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    block_user(auth.user_id, user_id, &state.deps).await?;
    Ok(Json(json!({ "message": "User blocked successfully" })))
}

/// POST /api/users/:id/unblock
pub async fn unblock_handler(
    auth: AuthUser,
    Path(user_id): Path<UserId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    unblock_user(auth.user_id, user_id, &state.deps).await?;
    Ok(Json(json!({ "message": "User unblocked successfully" })))
}

/// GET /api/users/blocked
pub async fn blocked_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let blocked = Block::blocked_by(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let blocked: Vec<UserSummary> = blocked.iter().map(UserSummary::from).collect();
    Ok(Json(json!({ "blockedUsers": blocked })))
}

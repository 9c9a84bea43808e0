use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::common::{ApiError, PageArgs, Pagination, PostId};
use crate::domains::posts::actions::{
    add_comment, create_post, toggle_like, CreatePostInput, UploadedImage,
};
use crate::domains::posts::data::{CommentData, PostData};
use crate::domains::posts::models::{Comment, Post, PostEdit, PostWithMeta};
use crate::domains::users::data::UserSummary;
use crate::domains::users::models::User;
use crate::server::app::AppState;
use crate::server::middleware::{AuthUser, MaybeAuthUser};
use crate::server::routes::{load_user_summaries, unknown_user};

const MAX_IMAGES_PER_POST: usize = 8;
const MAX_CAPTION_LENGTH: usize = 500;

/// Assemble API post list with batch-loaded author summaries.
async fn with_authors(
    posts: Vec<PostWithMeta>,
    state: &AppState,
) -> Result<Vec<PostData>, ApiError> {
    let author_ids: Vec<_> = posts.iter().map(|p| p.post.author_id).collect();
    let authors = load_user_summaries(&author_ids, &state.db_pool).await?;

    Ok(posts
        .into_iter()
        .map(|meta| {
            let author = authors
                .get(&meta.post.author_id)
                .cloned()
                .unwrap_or_else(unknown_user);
            PostData::from_meta(meta, author)
        })
        .collect())
}

/// Parsed multipart form for post creation.
#[derive(Default)]
struct CreatePostForm {
    caption: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    tags: Vec<String>,
    up_for_adoption: bool,
    images: Vec<UploadedImage>,
}

async fn parse_create_form(mut multipart: Multipart) -> Result<CreatePostForm, ApiError> {
    let mut form = CreatePostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "images" => {
                if form.images.len() >= MAX_IMAGES_PER_POST {
                    return Err(ApiError::invalid("Too many images"));
                }
                let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
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
                form.images.push(UploadedImage {
                    bytes: bytes.to_vec(),
                    file_name,
                    content_type,
                });
            }
            "caption" => {
                form.caption = read_text(field).await?;
            }
            "latitude" => {
                form.latitude = Some(read_number(field).await?);
            }
            "longitude" => {
                form.longitude = Some(read_number(field).await?);
            }
            "address" => form.address = Some(read_text(field).await?),
            "city" => form.city = Some(read_text(field).await?),
            "country" => form.country = Some(read_text(field).await?),
            "tags" => {
                let raw = read_text(field).await?;
                form.tags = raw
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            "isUpForAdoption" | "up_for_adoption" => {
                form.up_for_adoption = read_text(field).await? == "true";
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::invalid(format!("Malformed form data: {}", e)))
}

async fn read_number(field: axum::extract::multipart::Field<'_>) -> Result<f64, ApiError> {
    let text = read_text(field).await?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::invalid("Invalid coordinate"))
}

/// POST /api/posts
pub async fn create_post_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = parse_create_form(multipart).await?;

    if form.images.is_empty() {
        return Err(ApiError::invalid("At least one image is required"));
    }
    let (Some(latitude), Some(longitude)) = (form.latitude, form.longitude) else {
        return Err(ApiError::invalid("Location coordinates are required"));
    };
    if form.caption.len() > MAX_CAPTION_LENGTH {
        return Err(ApiError::invalid("Caption is too long"));
    }

    let post = create_post(
        auth.user_id,
        CreatePostInput {
            caption: form.caption,
            latitude,
            longitude,
            address: form.address,
            city: form.city,
            country: form.country,
            tags: form.tags,
            up_for_adoption: form.up_for_adoption,
        },
        form.images,
        &state.deps,
    )
    .await
    .map_err(ApiError::Internal)?;

    let author = User::find_by_id(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .map(|u| UserSummary::from(&u))
        .unwrap_or_else(unknown_user);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post": PostData::from_post(post, author),
        })),
    ))
}

/// PUT /api/posts/:id
pub async fn edit_post_handler(
    auth: AuthUser,
    Path(post_id): Path<PostId>,
    Extension(state): Extension<AppState>,
    Json(edit): Json<PostEdit>,
) -> Result<Json<Value>, ApiError> {
    let post = Post::find_by_id(post_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.author_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to edit this post"));
    }

    if let Some(caption) = &edit.caption {
        if caption.len() > MAX_CAPTION_LENGTH {
            return Err(ApiError::invalid("Caption is too long"));
        }
    }

    let updated = Post::update_editable(post_id, &edit, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let author = User::find_by_id(updated.author_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .map(|u| UserSummary::from(&u))
        .unwrap_or_else(unknown_user);

    Ok(Json(json!({
        "message": "Post updated",
        "post": PostData::from_post(updated, author),
    })))
}

/// GET /api/posts/feed
pub async fn feed_handler(
    auth: AuthUser,
    Query(args): Query<PageArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let page = args.validate();

    let posts = Post::feed(auth.user_id, page.limit, page.offset(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let total = Post::feed_count(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let posts = with_authors(posts, &state).await?;
    Ok(Json(json!({
        "posts": posts,
        "pagination": Pagination::new(&page, total),
    })))
}

#[derive(Deserialize)]
pub struct ExploreArgs {
    pub plant: Option<String>,
    pub tag: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/posts/explore
pub async fn explore_handler(
    viewer: MaybeAuthUser,
    Query(args): Query<ExploreArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let page = PageArgs {
        page: args.page,
        limit: args.limit,
    }
    .validate();

    let posts = Post::explore(
        viewer.user_id(),
        args.plant.as_deref(),
        args.tag.as_deref(),
        page.limit,
        page.offset(),
        &state.db_pool,
    )
    .await
    .map_err(ApiError::Internal)?;
    let total = Post::explore_count(args.plant.as_deref(), args.tag.as_deref(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let posts = with_authors(posts, &state).await?;
    Ok(Json(json!({
        "posts": posts,
        "pagination": Pagination::new(&page, total),
    })))
}

/// GET /api/posts/tags
pub async fn tags_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let tags = Post::top_tags(20, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "tags": tags })))
}

#[derive(Deserialize)]
pub struct AdoptionMapArgs {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
}

/// GET /api/posts/adoption-map
pub async fn adoption_map_handler(
    _auth: AuthUser,
    Query(args): Query<AdoptionMapArgs>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let (Some(latitude), Some(longitude)) = (args.latitude, args.longitude) else {
        return Err(ApiError::invalid("Location coordinates are required"));
    };
    let radius = args.radius.unwrap_or(50.0);

    let posts = Post::adoption_map(latitude, longitude, radius, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    let author_ids: Vec<_> = posts.iter().map(|p| p.post.author_id).collect();
    let authors = load_user_summaries(&author_ids, &state.db_pool).await?;

    let posts: Vec<PostData> = posts
        .into_iter()
        .map(|p| {
            let author = authors
                .get(&p.post.author_id)
                .cloned()
                .unwrap_or_else(unknown_user);
            PostData::from_distance(p, author)
        })
        .collect();

    Ok(Json(json!({
        "count": posts.len(),
        "radius": radius,
        "posts": posts,
    })))
}

/// POST /api/posts/:id/like
pub async fn like_handler(
    auth: AuthUser,
    Path(post_id): Path<PostId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let toggle = toggle_like(auth.user_id, post_id, &state.deps).await?;
    Ok(Json(json!({
        "message": if toggle.is_liked { "Post liked" } else { "Post unliked" },
        "isLiked": toggle.is_liked,
        "likeCount": toggle.like_count,
    })))
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/posts/:id/comment
pub async fn comment_handler(
    auth: AuthUser,
    Path(post_id): Path<PostId>,
    Extension(state): Extension<AppState>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let comment = add_comment(auth.user_id, post_id, &payload.text, &state.deps).await?;

    let user = User::find_by_id(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .map(|u| UserSummary::from(&u))
        .unwrap_or_else(unknown_user);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment added successfully",
            "comment": CommentData::from_comment(comment, user),
        })),
    ))
}

/// GET /api/posts/mine
pub async fn my_posts_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let posts = Post::by_author(auth.user_id, Some(auth.user_id), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let posts = with_authors(posts, &state).await?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /api/posts/liked/:username
pub async fn liked_posts_handler(
    viewer: MaybeAuthUser,
    Path(username): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let user = User::find_by_username(&username, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let posts = Post::liked_by(user.id, viewer.user_id(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let posts = with_authors(posts, &state).await?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /api/posts/:id
pub async fn get_post_handler(
    viewer: MaybeAuthUser,
    Path(post_id): Path<PostId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let post = Post::find_with_meta(post_id, viewer.user_id(), &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let author = User::find_by_id(post.post.author_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .map(|u| UserSummary::from(&u))
        .unwrap_or_else(unknown_user);

    let comments = Comment::find_by_post(post_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    let commenter_ids: Vec<_> = comments.iter().map(|c| c.author_id).collect();
    let commenters = load_user_summaries(&commenter_ids, &state.db_pool).await?;
    let comments: Vec<CommentData> = comments
        .into_iter()
        .map(|c| {
            let user = commenters
                .get(&c.author_id)
                .cloned()
                .unwrap_or_else(unknown_user);
            CommentData::from_comment(c, user)
        })
        .collect();

    Ok(Json(json!({
        "post": PostData::from_meta(post, author),
        "comments": comments,
    })))
}

/// DELETE /api/posts/:id
pub async fn delete_post_handler(
    auth: AuthUser,
    Path(post_id): Path<PostId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let post = Post::find_by_id(post_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    if post.author_id != auth.user_id {
        return Err(ApiError::forbidden("Not authorized to delete this post"));
    }

    Post::delete(post_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;

    // Stored images are cleaned up best-effort after the record is gone
    for url in &post.images {
        if let Err(e) = state.deps.image_store.delete(url).await {
            warn!(url = %url, error = %e, "image cleanup failed");
        }
    }

    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};

use crate::common::{ApiError, PlantId, PostId};
use crate::domains::adoption::machines::AdoptionAction;
use crate::domains::adoption::models::AdoptionEvent;
use crate::domains::adoption::run_transition;
use crate::domains::plants::models::Plant;
use crate::domains::posts::data::PostData;
use crate::domains::posts::models::Post;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::{load_user_summaries, unknown_user};

fn parse_action(action: &str) -> Result<AdoptionAction, ApiError> {
    action
        .parse()
        .map_err(|_| ApiError::invalid("Unknown adoption action"))
}

/// POST /api/posts/:id/adopt/:action
pub async fn post_adoption_handler(
    auth: AuthUser,
    Path((post_id, action)): Path<(PostId, String)>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let action = parse_action(&action)?;

    let post = Post::find_by_id(post_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let status = run_transition(&post, auth.user_id, action, &state.deps).await?;

    Ok(Json(json!({ "status": status })))
}

/// POST /api/plants/:id/adopt/:action
pub async fn plant_adoption_handler(
    auth: AuthUser,
    Path((plant_id, action)): Path<(PlantId, String)>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let action = parse_action(&action)?;

    let plant = Plant::find_by_id(plant_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Plant not found"))?;

    let status = run_transition(&plant, auth.user_id, action, &state.deps).await?;

    Ok(Json(json!({ "status": status })))
}

/// GET /api/plants/:id/adoption
pub async fn plant_adoption_status_handler(
    _auth: AuthUser,
    Path(plant_id): Path<PlantId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let plant = Plant::find_by_id(plant_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Plant not found"))?;

    Ok(Json(json!({
        "adoptionStatus": plant.adoption_status,
        "adoptionRequestedBy": plant.adoption_requested_by,
        "adoptedBy": plant.adopted_by,
    })))
}

/// GET /api/adoptions/me
///
/// Three lists for the adoption hub: requests the caller has open, listings
/// they have adopted, and incoming requests on their own listings.
pub async fn my_adoptions_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let pool = &state.db_pool;

    let requested = Post::requested_by_user(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;
    let adopted = Post::adopted_by_user(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;
    let incoming = Post::incoming_for_owner(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;

    let author_ids: Vec<_> = requested
        .iter()
        .chain(adopted.iter())
        .chain(incoming.iter())
        .map(|p| p.author_id)
        .collect();
    let authors = load_user_summaries(&author_ids, pool).await?;

    let to_data = |posts: Vec<Post>| -> Vec<PostData> {
        posts
            .into_iter()
            .map(|post| {
                let author = authors
                    .get(&post.author_id)
                    .cloned()
                    .unwrap_or_else(unknown_user);
                PostData::from_post(post, author)
            })
            .collect()
    };

    Ok(Json(json!({
        "requested": to_data(requested),
        "adopted": to_data(adopted),
        "incoming": to_data(incoming),
    })))
}

/// GET /api/adoptions/history
pub async fn adoption_history_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let events = AdoptionEvent::find_for_user(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "history": events })))
}

use axum::extract::{Extension, Path};
use axum::Json;
use serde_json::{json, Value};

use crate::common::{ApiError, NotificationId};
use crate::domains::notifications::data::NotificationData;
use crate::domains::notifications::models::Notification;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::load_user_summaries;

/// GET /api/notifications
pub async fn list_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let pool = &state.db_pool;

    let notifications = Notification::list_for(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;

    let actor_ids: Vec<_> = notifications.iter().map(|n| n.actor_id).collect();
    let actors = load_user_summaries(&actor_ids, pool).await?;

    // Notifications whose actor has been deleted are dropped rather than
    // rendered half-empty
    let notifications: Vec<NotificationData> = notifications
        .into_iter()
        .filter_map(|n| {
            let actor = actors.get(&n.actor_id).cloned()?;
            Some(NotificationData::from_notification(n, actor))
        })
        .collect();

    Ok(Json(json!({ "notifications": notifications })))
}

/// GET /api/notifications/unread-count
pub async fn unread_count_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let count = Notification::unread_count(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "count": count })))
}

/// PUT /api/notifications/:id/read
pub async fn mark_read_handler(
    auth: AuthUser,
    Path(id): Path<NotificationId>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let notification = Notification::mark_read(id, auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;

    Ok(Json(json!({ "notification": notification })))
}

/// PUT /api/notifications/mark-all-read
pub async fn mark_all_read_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    Notification::mark_all_read(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::ApiError;
use crate::domains::messaging::data::{ConversationSummary, MessageData};
use crate::domains::messaging::models::{conversation_key, Message, MAX_MESSAGE_LENGTH};
use crate::domains::users::data::UserSummary;
use crate::domains::users::models::User;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::{load_user_summaries, unknown_user};

/// GET /api/messages/conversations
pub async fn conversations_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let pool = &state.db_pool;

    let latest = Message::latest_per_conversation(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;

    let user_ids: Vec<_> = latest
        .iter()
        .flat_map(|m| [m.sender_id, m.receiver_id])
        .collect();
    let users = load_user_summaries(&user_ids, pool).await?;
    let summary_of = |id| users.get(&id).cloned().unwrap_or_else(unknown_user);

    let mut conversations = Vec::with_capacity(latest.len());
    for message in latest {
        let other_id = if message.sender_id == auth.user_id {
            message.receiver_id
        } else {
            message.sender_id
        };

        let unread_count =
            Message::unread_in_conversation(&message.conversation_key, auth.user_id, pool)
                .await
                .map_err(ApiError::Internal)?;

        let sender = summary_of(message.sender_id);
        let receiver = summary_of(message.receiver_id);
        conversations.push(ConversationSummary {
            conversation_key: message.conversation_key.clone(),
            other_user: summary_of(other_id),
            last_message: MessageData::from_message(message, sender, receiver),
            unread_count,
        });
    }

    // Newest conversation first
    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));

    Ok(Json(json!({ "conversations": conversations })))
}

/// GET /api/messages/conversation/:username
///
/// Returns the whole thread and marks it read for the caller.
pub async fn conversation_handler(
    auth: AuthUser,
    Path(username): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let pool = &state.db_pool;

    let other = User::find_by_username(&username, pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let key = conversation_key(auth.user_id, other.id);
    let messages = Message::find_by_conversation(&key, pool)
        .await
        .map_err(ApiError::Internal)?;

    Message::mark_conversation_read(&key, auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;

    let user_ids: Vec<_> = messages
        .iter()
        .flat_map(|m| [m.sender_id, m.receiver_id])
        .collect();
    let users = load_user_summaries(&user_ids, pool).await?;

    let messages: Vec<MessageData> = messages
        .into_iter()
        .map(|m| {
            let sender = users.get(&m.sender_id).cloned().unwrap_or_else(unknown_user);
            let receiver = users
                .get(&m.receiver_id)
                .cloned()
                .unwrap_or_else(unknown_user);
            MessageData::from_message(m, sender, receiver)
        })
        .collect();

    Ok(Json(json!({
        "messages": messages,
        "otherUser": UserSummary::from(&other),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_username: String,
    pub content: String,
}

/// POST /api/messages/send
pub async fn send_message_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::invalid("Message content is required"));
    }
    if content.len() > MAX_MESSAGE_LENGTH {
        return Err(ApiError::invalid("Message is too long"));
    }

    let pool = &state.db_pool;

    let receiver = User::find_by_username(&payload.receiver_username, pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if receiver.id == auth.user_id {
        return Err(ApiError::invalid("Cannot message yourself"));
    }

    let message = Message::send(auth.user_id, receiver.id, content, pool)
        .await
        .map_err(ApiError::Internal)?;

    let sender = User::find_by_id(auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?
        .map(|u| UserSummary::from(&u))
        .unwrap_or_else(unknown_user);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": MessageData::from_message(message, sender, UserSummary::from(&receiver)),
        })),
    ))
}

/// PUT /api/messages/mark-read/:username
pub async fn mark_read_handler(
    auth: AuthUser,
    Path(username): Path<String>,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let pool = &state.db_pool;

    let other = User::find_by_username(&username, pool)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let key = conversation_key(auth.user_id, other.id);
    Message::mark_conversation_read(&key, auth.user_id, pool)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({ "message": "Messages marked as read" })))
}

/// GET /api/messages/unread-count
pub async fn unread_count_handler(
    auth: AuthUser,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    let count = Message::unread_total(auth.user_id, &state.db_pool)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "unreadCount": count })))
}

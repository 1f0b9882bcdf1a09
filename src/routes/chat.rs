// SPDX-License-Identifier: MIT

//! Direct-message routes. New messages are pushed to connected
//! participants over WebSocket; offline participants get a
//! notification row instead.

use crate::db::notifications::NewNotification;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::chat::{ChatMessage, ConversationSummary};
use crate::services::push::PushEvent;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

const DEFAULT_PAGE: u32 = 50;
const MAX_PAGE: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/chat/conversations",
            get(list_conversations).post(start_conversation),
        )
        .route(
            "/api/chat/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
}

#[derive(Deserialize)]
pub struct StartConversationPayload {
    pub user_id: u64,
}

async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartConversationPayload>,
) -> Result<Json<serde_json::Value>> {
    if payload.user_id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot start a conversation with yourself".to_string(),
        ));
    }
    state
        .db
        .get_user(payload.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", payload.user_id)))?;

    let id = state
        .db
        .find_or_create_conversation(user.user_id, payload.user_id)
        .await?;
    Ok(Json(serde_json::json!({"id": id})))
}

async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ConversationSummary>>> {
    Ok(Json(state.db.list_conversations(user.user_id).await?))
}

#[derive(Deserialize)]
struct MessagesQuery {
    before_id: Option<u64>,
    limit: Option<u32>,
}

/// Oldest-first page of messages. Fetching also advances the reader's
/// unread marker.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Vec<ChatMessage>>> {
    require_participant(&state, id, user.user_id).await?;

    let limit = params.limit.unwrap_or(DEFAULT_PAGE).min(MAX_PAGE);
    let messages = state.db.list_messages(id, params.before_id, limit).await?;
    state.db.mark_conversation_read(id, user.user_id).await?;
    Ok(Json(messages))
}

#[derive(Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(length(min = 1, max = 4000))]
    pub body: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<Json<ChatMessage>> {
    payload.validate()?;
    require_participant(&state, id, user.user_id).await?;

    let message = state.db.add_message(id, user.user_id, &payload.body).await?;
    let sender_name = state
        .db
        .get_user(user.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_default();

    let others = state.db.other_participants(id, user.user_id).await?;
    let event = PushEvent {
        event: "chat_message".to_string(),
        payload: serde_json::to_value(&message).map_err(|e| AppError::Internal(e.into()))?,
    };

    for recipient in others {
        if state.push.is_online(recipient) {
            state.push.send_to_user(recipient, &event);
            continue;
        }
        // Offline recipients get a row in their notification feed.
        let result = state
            .notifier
            .notify(NewNotification {
                user_id: recipient,
                kind: "chat_message".to_string(),
                actor_id: Some(user.user_id),
                actor_name: Some(sender_name.clone()),
                object_type: Some("conversation".to_string()),
                object_id: Some(id),
                title: format!("{} sent you a message", sender_name),
                body: Some(payload.body.clone()),
            })
            .await;
        if let Err(err) = result {
            tracing::warn!(recipient, error = %err, "Chat notification failed");
        }
    }

    Ok(Json(message))
}

async fn require_participant(state: &AppState, conversation_id: u64, user_id: u64) -> Result<()> {
    if !state.db.is_participant(conversation_id, user_id).await? {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

// SPDX-License-Identifier: MIT

//! Notification feed and read-state routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::notification::AggregatedNotification;
use crate::services::notifier;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_FEED_LIMIT: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read", post(mark_read))
}

#[derive(Deserialize)]
struct FeedQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub notifications: Vec<AggregatedNotification>,
    pub unread_count: u32,
}

/// Aggregated feed, newest first. Unread rows about the same object are
/// merged into one entry carrying every actor and all row ids.
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(500);
    let rows = state.db.list_notifications(user.user_id, limit).await?;
    let unread_count = state.db.unread_notification_count(user.user_id).await?;
    Ok(Json(FeedResponse {
        notifications: notifier::aggregate(rows),
        unread_count,
    }))
}

#[derive(Deserialize)]
pub struct MarkReadPayload {
    /// Row ids to mark read. Omit (or pass `all: true`) to clear everything.
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub all: bool,
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<MarkReadPayload>,
) -> Result<Json<serde_json::Value>> {
    let updated = if payload.all || payload.ids.is_empty() {
        state.db.mark_all_notifications_read(user.user_id).await?
    } else {
        state
            .db
            .mark_notifications_read(user.user_id, &payload.ids)
            .await?
    };
    Ok(Json(serde_json::json!({"updated": updated})))
}

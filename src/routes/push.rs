// SPDX-License-Identifier: MIT

//! WebSocket endpoint for realtime delivery plus the HMAC-secured
//! internal push endpoint other services call to fan events out.

use crate::error::{AppError, Result};
use crate::middleware::auth::verify_token;
use crate::middleware::push_auth::verify_push_signature;
use crate::services::push::PushEvent;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/internal/push", post(internal_push))
}

#[derive(Deserialize)]
struct WsQuery {
    token: String,
}

/// Browsers cannot set headers on WebSocket handshakes, so the JWT
/// arrives as a query parameter instead.
async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    let user = verify_token(&state.config.jwt_signing_key, &params.token)
        .ok_or(AppError::InvalidToken)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user.user_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: u64) {
    let (conn_id, mut events) = state.push.register(user_id);
    let (mut sink, mut stream) = socket.split();

    // Drain the registry channel into the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = events.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames are ignored apart from close and ping handling,
    // which axum does for us.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.push.unregister(user_id, conn_id);
}

#[derive(Deserialize)]
pub struct InternalPushPayload {
    pub user_ids: Vec<u64>,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Deliver an event to connected clients on behalf of another service.
/// The raw body is HMAC-signed with the shared push secret.
async fn internal_push(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    verify_push_signature(&state.config.push_shared_secret, &headers, &body)?;

    let payload: InternalPushPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid push payload: {}", e)))?;

    let delivered = state.push.send_to_users(
        &payload.user_ids,
        &PushEvent {
            event: payload.event,
            payload: payload.payload,
        },
    );
    Ok(Json(serde_json::json!({"delivered": delivered})))
}

// SPDX-License-Identifier: MIT

//! Current-user profile and payment history.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Payment, User};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/payments", get(get_payments))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(profile))
}

/// Payment history, newest first.
async fn get_payments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Payment>>> {
    Ok(Json(state.db.list_payments(user.user_id).await?))
}

// SPDX-License-Identifier: MIT

//! Admin routes: moderation queue, analytics, user management, refunds.
//!
//! The `require_admin` layer in routes/mod.rs guards everything here.

use crate::db::notifications::NewNotification;
use crate::db::recipes::RecipeFilter;
use crate::error::{AppError, Result};
use crate::models::recipe::{Recipe, RECIPE_APPROVED, RECIPE_PENDING, RECIPE_REJECTED};
use crate::models::subscription::{
    SubscriptionRefund, PAYMENT_KIND_RECIPE, PAYMENT_KIND_SUBSCRIPTION, REFUND_APPROVED,
    REFUND_DENIED, REFUND_PENDING,
};
use crate::models::user;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/recipes", get(moderation_queue))
        .route("/api/admin/recipes/{id}/approve", post(approve_recipe))
        .route("/api/admin/recipes/{id}/reject", post(reject_recipe))
        .route("/api/admin/analytics", get(analytics))
        .route("/api/admin/users/{id}/suspend", post(suspend_user))
        .route("/api/admin/users/{id}/activate", post(activate_user))
        .route("/api/admin/refunds", get(list_refunds))
        .route("/api/admin/refunds/{id}/resolve", post(resolve_refund))
}

// ─── Moderation ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ModerationQuery {
    /// Defaults to the pending queue
    status: Option<String>,
}

const MODERATION_PAGE: u32 = 100;

async fn moderation_queue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ModerationQuery>,
) -> Result<Json<Vec<Recipe>>> {
    let status = params.status.unwrap_or_else(|| RECIPE_PENDING.to_string());
    let filter = RecipeFilter {
        status: Some(status),
        ..Default::default()
    };
    Ok(Json(
        state.db.list_recipes(&filter, None, MODERATION_PAGE).await?,
    ))
}

async fn approve_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    state
        .db
        .set_recipe_status(id, RECIPE_APPROVED, None)
        .await?;
    tracing::info!(recipe_id = id, "Recipe approved");

    if let Err(e) = state
        .notifier
        .notify(NewNotification {
            user_id: recipe.user_id,
            kind: "recipe_approved".to_string(),
            actor_id: None,
            actor_name: None,
            object_type: Some("recipe".to_string()),
            object_id: Some(id),
            title: "Your recipe was approved".to_string(),
            body: Some(recipe.title),
        })
        .await
    {
        tracing::warn!(error = %e, "Approval notification failed");
    }
    Ok(Json(serde_json::json!({"success": true})))
}

#[derive(Deserialize, Validate)]
struct RejectRequest {
    #[validate(length(min = 1, max = 500))]
    reason: String,
}

async fn reject_recipe(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;

    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    state
        .db
        .set_recipe_status(id, RECIPE_REJECTED, Some(&payload.reason))
        .await?;
    tracing::info!(recipe_id = id, reason = %payload.reason, "Recipe rejected");

    if let Err(e) = state
        .notifier
        .notify(NewNotification {
            user_id: recipe.user_id,
            kind: "recipe_rejected".to_string(),
            actor_id: None,
            actor_name: None,
            object_type: Some("recipe".to_string()),
            object_id: Some(id),
            title: "Your recipe was rejected".to_string(),
            body: Some(payload.reason),
        })
        .await
    {
        tracing::warn!(error = %e, "Rejection notification failed");
    }
    Ok(Json(serde_json::json!({"success": true})))
}

// ─── Analytics ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub total_users: i64,
    pub recipes: RecipeCounts,
    pub active_subscriptions: i64,
    pub revenue_cents: RevenueBreakdown,
    pub signups_last_30_days: Vec<crate::db::analytics::SignupPoint>,
}

#[derive(Serialize)]
pub struct RecipeCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Serialize)]
pub struct RevenueBreakdown {
    pub subscriptions: i64,
    pub recipes: i64,
}

/// Dashboard totals. Sections backed by missing tables come back zeroed.
async fn analytics(State(state): State<Arc<AppState>>) -> Result<Json<AnalyticsResponse>> {
    let db = &state.db;

    Ok(Json(AnalyticsResponse {
        total_users: db.count_users().await?,
        recipes: RecipeCounts {
            pending: db.count_recipes_with_status(RECIPE_PENDING).await?,
            approved: db.count_recipes_with_status(RECIPE_APPROVED).await?,
            rejected: db.count_recipes_with_status(RECIPE_REJECTED).await?,
        },
        active_subscriptions: db.count_active_subscriptions().await?,
        revenue_cents: RevenueBreakdown {
            subscriptions: db.revenue_cents(PAYMENT_KIND_SUBSCRIPTION).await?,
            recipes: db.revenue_cents(PAYMENT_KIND_RECIPE).await?,
        },
        signups_last_30_days: db.signups_last_30_days().await?,
    }))
}

// ─── User Management ─────────────────────────────────────────

async fn suspend_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    state
        .db
        .set_user_status(id, user::STATUS_SUSPENDED)
        .await?;
    tracing::info!(user_id = id, "User suspended");
    Ok(Json(serde_json::json!({"success": true})))
}

async fn activate_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    state.db.set_user_status(id, user::STATUS_ACTIVE).await?;
    tracing::info!(user_id = id, "User activated");
    Ok(Json(serde_json::json!({"success": true})))
}

// ─── Refunds ─────────────────────────────────────────────────

async fn list_refunds(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SubscriptionRefund>>> {
    Ok(Json(state.db.list_refunds().await?))
}

#[derive(Deserialize)]
struct ResolveRequest {
    /// True approves and refunds at the gateway; false denies.
    approve: bool,
}

/// Resolve a pending refund request. Approval calls the gateway first; the
/// local state only changes after the gateway accepts.
async fn resolve_refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<ResolveRequest>,
) -> Result<Json<serde_json::Value>> {
    let refund = state
        .db
        .get_refund(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Refund {} not found", id)))?;

    if refund.status != REFUND_PENDING {
        return Err(AppError::BadRequest("Refund already resolved".to_string()));
    }

    if payload.approve {
        let payment = state
            .db
            .get_payment(refund.payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        state
            .gateway
            .refund(&payment.reference, refund.amount_cents)
            .await?;
        state.db.resolve_refund(id, REFUND_APPROVED, true).await?;
        tracing::info!(refund_id = id, amount_cents = refund.amount_cents, "Refund approved");
    } else {
        state.db.resolve_refund(id, REFUND_DENIED, false).await?;
        tracing::info!(refund_id = id, "Refund denied");
    }

    Ok(Json(serde_json::json!({"success": true})))
}

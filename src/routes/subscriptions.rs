// SPDX-License-Identifier: MIT

//! Subscription routes and the payment gateway webhook.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::subscription::{Subscription, SubscriptionPlan, SUB_ACTIVE, SUB_PENDING};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::HeaderMap,
    routing::{get, post},
    Extension, Router,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Routes that require a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/subscriptions/current", get(current_subscription))
        .route("/api/subscriptions", post(create_subscription))
        .route("/api/subscriptions/verify", post(verify_subscription))
        .route("/api/subscriptions/cancel", post(cancel_subscription))
        .route("/api/subscriptions/refunds", post(request_refund))
}

/// Public routes: plan listing and the gateway webhook.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/subscription-plans", get(list_plans))
        .route("/api/payments/webhook", post(gateway_webhook))
}

// ─── Plans ───────────────────────────────────────────────────

async fn list_plans(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SubscriptionPlan>>> {
    Ok(Json(state.db.list_plans().await?))
}

// ─── Subscribe / Verify / Cancel ─────────────────────────────

#[derive(Serialize)]
pub struct CurrentSubscriptionResponse {
    pub subscription: Option<Subscription>,
}

async fn current_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CurrentSubscriptionResponse>> {
    Ok(Json(CurrentSubscriptionResponse {
        subscription: state.db.current_subscription(user.user_id).await?,
    }))
}

#[derive(Deserialize)]
struct SubscribeRequest {
    plan_id: u64,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub subscription_id: u64,
    pub checkout_url: String,
    pub reference: String,
}

/// Effect of a user's existing subscription on a new checkout.
#[derive(Debug, PartialEq)]
enum ExistingSubscription {
    /// Paid-up coverage; refuse a second checkout.
    Blocks,
    /// Abandoned checkout; cancel it and start over.
    Superseded,
    /// Cancelled but still inside its paid period; checkout may proceed.
    Ignored,
}

fn classify_existing(status: &str) -> ExistingSubscription {
    match status {
        SUB_ACTIVE => ExistingSubscription::Blocks,
        SUB_PENDING => ExistingSubscription::Superseded,
        _ => ExistingSubscription::Ignored,
    }
}

/// Start a subscription: create a pending row and a gateway checkout.
async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>> {
    if let Some(existing) = state.db.current_subscription(user.user_id).await? {
        match classify_existing(&existing.status) {
            ExistingSubscription::Blocks => {
                return Err(AppError::BadRequest(
                    "An active subscription already exists".to_string(),
                ));
            }
            ExistingSubscription::Superseded => {
                state.db.cancel_subscription(existing.id).await?;
                tracing::info!(
                    user_id = user.user_id,
                    subscription_id = existing.id,
                    "Superseding abandoned pending subscription"
                );
            }
            ExistingSubscription::Ignored => {}
        }
    }

    let plan = state
        .db
        .get_plan(payload.plan_id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", payload.plan_id)))?;

    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let reference = format!(
        "fs-sub-{}-{}",
        user.user_id,
        chrono::Utc::now().timestamp_millis()
    );

    let session = state
        .gateway
        .initialize(
            &profile.email,
            plan.price_cents,
            &state.config.currency,
            &reference,
        )
        .await?;

    let subscription_id = state
        .db
        .create_pending_subscription(user.user_id, &plan, &session.reference, &state.config.currency)
        .await?;

    tracing::info!(
        user_id = user.user_id,
        plan = %plan.code,
        reference = %session.reference,
        "Subscription checkout created"
    );

    Ok(Json(SubscribeResponse {
        subscription_id,
        checkout_url: session.authorization_url,
        reference: session.reference,
    }))
}

#[derive(Deserialize)]
struct VerifyRequest {
    reference: String,
}

/// Confirm a charge with the gateway and activate the subscription.
async fn verify_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Subscription>> {
    let charge = state.gateway.verify(&payload.reference).await?;
    if !charge.is_success() {
        return Err(AppError::BadRequest(format!(
            "Charge not successful: {}",
            charge.status
        )));
    }

    let subscription = state
        .db
        .activate_subscription(&payload.reference)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown payment reference".to_string()))?;

    if subscription.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    tracing::info!(
        user_id = user.user_id,
        subscription_id = subscription.id,
        "Subscription activated"
    );
    Ok(Json(subscription))
}

/// Cancel the current subscription; access lasts until the period end.
async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>> {
    let subscription = state
        .db
        .current_subscription(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription to cancel".to_string()))?;

    if subscription.status != SUB_ACTIVE {
        return Err(AppError::BadRequest(
            "Only active subscriptions can be cancelled".to_string(),
        ));
    }

    state.db.cancel_subscription(subscription.id).await?;
    tracing::info!(
        user_id = user.user_id,
        subscription_id = subscription.id,
        "Subscription cancelled"
    );
    Ok(Json(serde_json::json!({"success": true})))
}

// ─── Refund Requests ─────────────────────────────────────────

#[derive(Deserialize)]
struct RefundRequest {
    payment_id: u64,
    reason: Option<String>,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub refund_id: u64,
}

/// Ask for a refund of one of your subscription payments.
async fn request_refund(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RefundRequest>,
) -> Result<Json<RefundResponse>> {
    let payment = state
        .db
        .get_payment(payload.payment_id)
        .await?
        .filter(|p| p.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    let subscription = state
        .db
        .current_subscription(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription for this payment".to_string()))?;

    let refund_id = state
        .db
        .create_refund_request(
            subscription.id,
            payment.id,
            payment.amount_cents,
            payload.reason.as_deref(),
        )
        .await?;

    tracing::info!(
        user_id = user.user_id,
        refund_id,
        payment_id = payment.id,
        "Refund requested"
    );
    Ok(Json(RefundResponse { refund_id }))
}

// ─── Gateway Webhook ─────────────────────────────────────────

#[derive(Deserialize)]
struct WebhookEvent {
    event: String,
    data: WebhookData,
}

#[derive(Deserialize)]
struct WebhookData {
    reference: String,
}

/// Gateway webhook: `charge.success` activates the matching subscription.
///
/// The raw body is authenticated with hex HMAC-SHA256 in
/// `x-gateway-signature`. Idempotent by reference: re-delivery of a
/// processed event is a 200 no-op.
async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>> {
    let provided = headers
        .get("x-gateway-signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Forbidden)?;
    let provided = hex::decode(provided).map_err(|_| AppError::Forbidden)?;

    let mut mac = HmacSha256::new_from_slice(&state.config.gateway_webhook_secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(&body);
    let expected = mac.finalize().into_bytes();

    if !bool::from(expected.ct_eq(provided.as_slice())) {
        tracing::warn!("Webhook signature mismatch");
        return Err(AppError::Forbidden);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Malformed webhook body".to_string()))?;

    match event.event.as_str() {
        // activate_subscription is a no-op for non-pending rows, so a
        // re-delivered confirmation changes nothing.
        "charge.success" => {
            match state.db.activate_subscription(&event.data.reference).await? {
                Some(subscription) => {
                    tracing::info!(
                        subscription_id = subscription.id,
                        reference = %event.data.reference,
                        "Webhook activated subscription"
                    );
                }
                None => {
                    tracing::warn!(
                        reference = %event.data.reference,
                        "Webhook for unknown reference"
                    );
                }
            }
        }
        other => {
            tracing::debug!(event = %other, "Ignoring webhook event");
        }
    }

    Ok(Json(serde_json::json!({"received": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::SUB_CANCELLED;

    #[test]
    fn test_active_subscription_blocks_new_checkout() {
        assert_eq!(classify_existing(SUB_ACTIVE), ExistingSubscription::Blocks);
    }

    #[test]
    fn test_abandoned_checkout_is_superseded() {
        assert_eq!(
            classify_existing(SUB_PENDING),
            ExistingSubscription::Superseded
        );
    }

    #[test]
    fn test_cancelled_subscription_allows_new_checkout() {
        assert_eq!(
            classify_existing(SUB_CANCELLED),
            ExistingSubscription::Ignored
        );
    }
}

// SPDX-License-Identifier: MIT

//! Subscription, plan, refund and payment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SUB_PENDING: &str = "pending";
pub const SUB_ACTIVE: &str = "active";
pub const SUB_CANCELLED: &str = "cancelled";

pub const REFUND_PENDING: &str = "pending";
pub const REFUND_APPROVED: &str = "approved";
pub const REFUND_DENIED: &str = "denied";

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_SUCCESS: &str = "success";
pub const PAYMENT_FAILED: &str = "failed";

/// Anything other than yearly in `subscription_plans.interval` bills monthly.
pub const INTERVAL_YEARLY: &str = "yearly";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionPlan {
    pub id: u64,
    /// Stable code used by the front end ("pro-monthly")
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    /// "monthly" or "yearly"
    pub interval: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: u64,
    pub user_id: u64,
    pub plan_id: u64,
    /// "pending", "active" or "cancelled"; a cancelled subscription expires
    /// once `current_period_end` passes.
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Reference returned by the payment gateway at checkout
    pub gateway_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubscriptionRefund {
    pub id: u64,
    pub subscription_id: u64,
    pub payment_id: u64,
    pub amount_cents: i64,
    pub reason: Option<String>,
    /// "pending", "approved" or "denied"
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Payment kinds stored in `payments.kind`.
pub const PAYMENT_KIND_SUBSCRIPTION: &str = "subscription";
pub const PAYMENT_KIND_RECIPE: &str = "recipe";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: u64,
    pub user_id: u64,
    /// "subscription" or "recipe"
    pub kind: String,
    /// Gateway reference, unique; used for webhook idempotency
    pub reference: String,
    pub amount_cents: i64,
    pub currency: String,
    /// "pending", "success" or "failed"
    pub status: String,
    pub created_at: DateTime<Utc>,
}

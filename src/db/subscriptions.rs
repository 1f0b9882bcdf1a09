// SPDX-License-Identifier: MIT

//! Subscription, plan, refund and payment operations.

use super::schema::BindValue;
use super::{soft_empty, soft_none, Db};
use crate::error::AppError;
use crate::models::subscription::{
    Payment, Subscription, SubscriptionPlan, SubscriptionRefund, INTERVAL_YEARLY,
    PAYMENT_FAILED, PAYMENT_KIND_SUBSCRIPTION, PAYMENT_PENDING, PAYMENT_SUCCESS, REFUND_PENDING,
    SUB_ACTIVE, SUB_CANCELLED, SUB_PENDING,
};
use chrono::{DateTime, Duration, Utc};

/// A confirmed charge only applies to a subscription still awaiting
/// payment. An already-active one (webhook re-delivery) and one cancelled
/// after checkout (abandoned and superseded) are both left untouched.
fn needs_activation(subscription: &Subscription) -> bool {
    subscription.status == SUB_PENDING
}

/// Period granted by a confirmed charge.
fn paid_period_end(interval: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if interval == INTERVAL_YEARLY {
        now + Duration::days(365)
    } else {
        now + Duration::days(30)
    }
}

impl Db {
    // ─── Plans ───────────────────────────────────────────────────

    /// Active plans, cheapest first.
    pub async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let result = sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT * FROM subscription_plans WHERE active = 1 ORDER BY price_cents",
        )
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "subscription_plans")
    }

    pub async fn get_plan(&self, plan_id: u64) -> Result<Option<SubscriptionPlan>, AppError> {
        let result =
            sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = ?")
                .bind(plan_id)
                .fetch_optional(self.pool()?)
                .await;
        soft_none(result, "subscription_plans")
    }

    // ─── Subscriptions ───────────────────────────────────────────

    /// The user's current (pending, active or cancelled-but-unexpired)
    /// subscription, if any.
    pub async fn current_subscription(
        &self,
        user_id: u64,
    ) -> Result<Option<Subscription>, AppError> {
        let result = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE user_id = ? \
             AND (status = ? OR status = ? OR (status = ? AND current_period_end > UTC_TIMESTAMP())) \
             ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(SUB_ACTIVE)
        .bind(SUB_PENDING)
        .bind(SUB_CANCELLED)
        .fetch_optional(self.pool()?)
        .await;
        soft_none(result, "subscriptions")
    }

    /// Create a pending subscription and its pending payment.
    ///
    /// The subscription insert is drift-tolerant: `gateway_reference` is a
    /// late addition and may be absent on old deployments.
    pub async fn create_pending_subscription(
        &self,
        user_id: u64,
        plan: &SubscriptionPlan,
        reference: &str,
        currency: &str,
    ) -> Result<u64, AppError> {
        let subscription_id = self
            .insert_existing_columns(
                "subscriptions",
                vec![
                    ("user_id", BindValue::U64(user_id)),
                    ("plan_id", BindValue::U64(plan.id)),
                    ("status", BindValue::Str(SUB_PENDING.to_string())),
                    (
                        "gateway_reference",
                        BindValue::OptStr(Some(reference.to_string())),
                    ),
                ],
            )
            .await?;

        sqlx::query(
            "INSERT INTO payments (user_id, kind, reference, amount_cents, currency, status, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(user_id)
        .bind(PAYMENT_KIND_SUBSCRIPTION)
        .bind(reference)
        .bind(plan.price_cents)
        .bind(currency)
        .bind(PAYMENT_PENDING)
        .execute(self.pool()?)
        .await?;

        Ok(subscription_id)
    }

    /// Flip a pending subscription to active once the gateway confirms the
    /// charge. Idempotent: a subscription that is no longer pending (already
    /// active, or cancelled since checkout) is returned as-is without
    /// touching it or its payment row. Returns `None` when the reference is
    /// unknown.
    pub async fn activate_subscription(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let existing = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE gateway_reference = ?",
        )
        .bind(reference)
        .fetch_optional(self.pool()?)
        .await?;

        let Some(subscription) = existing else {
            return Ok(None);
        };

        if !needs_activation(&subscription) {
            return Ok(Some(subscription));
        }

        let plan = self
            .get_plan(subscription.plan_id)
            .await?
            .ok_or_else(|| AppError::Database("Subscription references missing plan".into()))?;

        let now = Utc::now();
        let period_end = paid_period_end(&plan.interval, now);

        let mut tx = self.pool()?.begin().await?;
        sqlx::query(
            "UPDATE subscriptions SET status = ?, started_at = ?, current_period_end = ? \
             WHERE id = ?",
        )
        .bind(SUB_ACTIVE)
        .bind(now)
        .bind(period_end)
        .bind(subscription.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE payments SET status = ? WHERE reference = ?")
            .bind(PAYMENT_SUCCESS)
            .bind(reference)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get_subscription(subscription.id).await
    }

    pub async fn get_subscription(
        &self,
        subscription_id: u64,
    ) -> Result<Option<Subscription>, AppError> {
        let result = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = ?")
            .bind(subscription_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "subscriptions")
    }

    /// Mark a subscription cancelled; it stays usable until period end.
    pub async fn cancel_subscription(&self, subscription_id: u64) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = ?, cancelled_at = UTC_TIMESTAMP() WHERE id = ?",
        )
        .bind(SUB_CANCELLED)
        .bind(subscription_id)
        .execute(self.pool()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Subscription {} not found",
                subscription_id
            )));
        }
        Ok(())
    }

    // ─── Refunds ─────────────────────────────────────────────────

    pub async fn create_refund_request(
        &self,
        subscription_id: u64,
        payment_id: u64,
        amount_cents: i64,
        reason: Option<&str>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO subscription_refunds (subscription_id, payment_id, amount_cents, \
             reason, status, requested_at) VALUES (?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(subscription_id)
        .bind(payment_id)
        .bind(amount_cents)
        .bind(reason)
        .bind(REFUND_PENDING)
        .execute(self.pool()?)
        .await?;
        Ok(result.last_insert_id())
    }

    pub async fn get_refund(&self, refund_id: u64) -> Result<Option<SubscriptionRefund>, AppError> {
        let result = sqlx::query_as::<_, SubscriptionRefund>(
            "SELECT * FROM subscription_refunds WHERE id = ?",
        )
        .bind(refund_id)
        .fetch_optional(self.pool()?)
        .await;
        soft_none(result, "subscription_refunds")
    }

    /// All refund requests, pending first.
    pub async fn list_refunds(&self) -> Result<Vec<SubscriptionRefund>, AppError> {
        let result = sqlx::query_as::<_, SubscriptionRefund>(
            "SELECT * FROM subscription_refunds \
             ORDER BY (status = 'pending') DESC, requested_at DESC",
        )
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "subscription_refunds")
    }

    /// Resolve a refund; on approval the payment is marked failed so revenue
    /// reports exclude it.
    pub async fn resolve_refund(
        &self,
        refund_id: u64,
        status: &str,
        mark_payment_failed: bool,
    ) -> Result<(), AppError> {
        let refund = self
            .get_refund(refund_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Refund {} not found", refund_id)))?;

        let mut tx = self.pool()?.begin().await?;
        sqlx::query(
            "UPDATE subscription_refunds SET status = ?, resolved_at = UTC_TIMESTAMP() \
             WHERE id = ?",
        )
        .bind(status)
        .bind(refund_id)
        .execute(&mut *tx)
        .await?;

        if mark_payment_failed {
            sqlx::query("UPDATE payments SET status = ? WHERE id = ?")
                .bind(PAYMENT_FAILED)
                .bind(refund.payment_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    // ─── Payments ────────────────────────────────────────────────

    pub async fn get_payment(&self, payment_id: u64) -> Result<Option<Payment>, AppError> {
        let result = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(payment_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "payments")
    }

    pub async fn get_payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, AppError> {
        let result = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE reference = ?")
            .bind(reference)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "payments")
    }

    /// Payments made by a user, newest first.
    pub async fn list_payments(&self, user_id: u64) -> Result<Vec<Payment>, AppError> {
        let result = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "payments")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: &str) -> Subscription {
        Subscription {
            id: 1,
            user_id: 7,
            plan_id: 2,
            status: status.to_string(),
            started_at: None,
            current_period_end: None,
            cancelled_at: None,
            gateway_reference: Some("fs-sub-7-1".to_string()),
        }
    }

    #[test]
    fn test_pending_subscription_activates() {
        assert!(needs_activation(&subscription(SUB_PENDING)));
    }

    #[test]
    fn test_redelivered_confirmation_is_a_noop() {
        assert!(!needs_activation(&subscription(SUB_ACTIVE)));
    }

    #[test]
    fn test_superseded_checkout_never_activates() {
        assert!(!needs_activation(&subscription(SUB_CANCELLED)));
    }

    #[test]
    fn test_yearly_plans_get_a_year() {
        let now = Utc::now();
        assert_eq!(
            paid_period_end(INTERVAL_YEARLY, now),
            now + Duration::days(365)
        );
    }

    #[test]
    fn test_other_intervals_bill_monthly() {
        let now = Utc::now();
        assert_eq!(paid_period_end("monthly", now), now + Duration::days(30));
    }
}

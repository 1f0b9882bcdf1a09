// SPDX-License-Identifier: MIT

//! Aggregate queries backing the admin analytics dashboard.
//!
//! Every section degrades to zeros when its table is missing, so a fresh
//! deployment with a partial schema still renders a dashboard.

use super::{is_schema_drift, Db};
use crate::error::AppError;
use crate::models::subscription::{PAYMENT_SUCCESS, SUB_ACTIVE};

/// One point in the 30-day signup series.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SignupPoint {
    /// "YYYY-MM-DD"
    pub day: String,
    pub count: i64,
}

impl Db {
    async fn count(&self, sql: &str, binds: &[&str]) -> Result<i64, AppError> {
        let mut query = sqlx::query_as::<_, (i64,)>(sql);
        for b in binds {
            query = query.bind(*b);
        }
        match query.fetch_one(self.pool()?).await {
            Ok((n,)) => Ok(n),
            Err(err) if is_schema_drift(&err) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        self.count("SELECT COUNT(*) FROM users", &[]).await
    }

    pub async fn count_recipes_with_status(&self, status: &str) -> Result<i64, AppError> {
        self.count("SELECT COUNT(*) FROM recipes WHERE status = ?", &[status])
            .await
    }

    pub async fn count_active_subscriptions(&self) -> Result<i64, AppError> {
        self.count(
            "SELECT COUNT(*) FROM subscriptions WHERE status = ?",
            &[SUB_ACTIVE],
        )
        .await
    }

    /// Successful revenue in cents for one payment kind.
    pub async fn revenue_cents(&self, kind: &str) -> Result<i64, AppError> {
        let result = sqlx::query_as::<_, (Option<i64>,)>(
            "SELECT SUM(amount_cents) FROM payments WHERE kind = ? AND status = ?",
        )
        .bind(kind)
        .bind(PAYMENT_SUCCESS)
        .fetch_one(self.pool()?)
        .await;
        match result {
            Ok((sum,)) => Ok(sum.unwrap_or(0)),
            Err(err) if is_schema_drift(&err) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    /// Signups per day over the trailing 30 days.
    pub async fn signups_last_30_days(&self) -> Result<Vec<SignupPoint>, AppError> {
        let result = sqlx::query_as::<_, SignupPoint>(
            "SELECT DATE_FORMAT(created_at, '%Y-%m-%d') AS day, COUNT(*) AS count \
             FROM users WHERE created_at >= UTC_TIMESTAMP() - INTERVAL 30 DAY \
             GROUP BY day ORDER BY day",
        )
        .fetch_all(self.pool()?)
        .await;
        match result {
            Ok(points) => Ok(points),
            Err(err) if is_schema_drift(&err) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }
}

// SPDX-License-Identifier: MIT

//! Notification storage operations.
//!
//! Aggregation (merge-by-key, actor de-duplication, title formatting)
//! happens in `services::notifier`; this module only stores and reads rows.

use super::{soft_empty, Db};
use crate::error::AppError;
use crate::models::Notification;

/// Input for a new notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: u64,
    pub kind: String,
    pub actor_id: Option<u64>,
    pub actor_name: Option<String>,
    pub object_type: Option<String>,
    pub object_id: Option<u64>,
    pub title: String,
    pub body: Option<String>,
}

impl Db {
    /// Insert a notification, returning the full row.
    pub async fn create_notification(
        &self,
        new: &NewNotification,
    ) -> Result<Notification, AppError> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, actor_id, actor_name, object_type, \
             object_id, title, body, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(new.user_id)
        .bind(&new.kind)
        .bind(new.actor_id)
        .bind(&new.actor_name)
        .bind(&new.object_type)
        .bind(new.object_id)
        .bind(&new.title)
        .bind(&new.body)
        .execute(self.pool()?)
        .await?;

        let row =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
                .bind(result.last_insert_id())
                .fetch_one(self.pool()?)
                .await?;
        Ok(row)
    }

    /// Recent notifications for a user, newest first.
    pub async fn list_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, AppError> {
        let result = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC \
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "notifications")
    }

    pub async fn unread_notification_count(&self, user_id: u64) -> Result<u32, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.pool()?)
        .await?;
        Ok(row.0 as u32)
    }

    /// Mark specific notifications read; ids belonging to other users are
    /// ignored by the WHERE clause.
    pub async fn mark_notifications_read(
        &self,
        user_id: u64,
        ids: &[u64],
    ) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE notifications SET read_at = UTC_TIMESTAMP() \
             WHERE user_id = ? AND read_at IS NULL AND id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(user_id);
        for id in ids {
            query = query.bind(id);
        }
        let result = query.execute(self.pool()?).await?;
        Ok(result.rows_affected())
    }

    /// Mark everything read.
    pub async fn mark_all_notifications_read(&self, user_id: u64) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = UTC_TIMESTAMP() \
             WHERE user_id = ? AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(self.pool()?)
        .await?;
        Ok(result.rows_affected())
    }
}

// SPDX-License-Identifier: MIT

//! User operations.

use super::{soft_none, Db};
use crate::error::AppError;
use crate::models::user::{self, User};

impl Db {
    /// Get a user by id.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "users")
    }

    /// Get a user by email (login path).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "users")
    }

    /// Insert a new user, returning the row id.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, name, role, status, created_at) \
             VALUES (?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(user::ROLE_USER)
        .bind(user::STATUS_ACTIVE)
        .execute(self.pool()?)
        .await?;
        Ok(result.last_insert_id())
    }

    /// Bump `last_active` on login.
    pub async fn touch_last_active(&self, user_id: u64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_active = UTC_TIMESTAMP() WHERE id = ?")
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        Ok(())
    }

    /// Set account status ("active" / "suspended").
    pub async fn set_user_status(&self, user_id: u64, status: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status)
            .bind(user_id)
            .execute(self.pool()?)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    /// Ids of all active users (broadcast target set).
    pub async fn active_user_ids(&self) -> Result<Vec<u64>, AppError> {
        let rows: Vec<(u64,)> = sqlx::query_as("SELECT id FROM users WHERE status = ?")
            .bind(user::STATUS_ACTIVE)
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

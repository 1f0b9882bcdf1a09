// SPDX-License-Identifier: MIT

//! Database layer (MySQL via sqlx).
//!
//! `Db` wraps the connection pool with typed operations, grouped by domain:
//! - users / auth
//! - recipes, purchases and favorites
//! - subscriptions, plans, refunds and payments
//! - diet plans, meal logs and hydration
//! - meal plans and calendar events
//! - notifications
//! - chat
//!
//! The schema has drifted across deployments, so reads against tables or
//! columns that do not exist degrade to empty results, and the recipe /
//! subscription insert paths probe `SHOW COLUMNS` before writing
//! (see [`schema`]).

pub mod analytics;
pub mod chat;
pub mod diet;
pub mod notifications;
pub mod planner;
pub mod recipes;
pub mod schema;
pub mod subscriptions;
pub mod users;

use crate::error::AppError;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::sync::Arc;

/// MySQL error numbers treated as schema drift rather than hard failures.
const ER_NO_SUCH_TABLE: &str = "1146";
const ER_BAD_FIELD: &str = "1054";

/// Database handle shared across handlers.
#[derive(Clone)]
pub struct Db {
    pool: Option<MySqlPool>,
    /// Cached `SHOW COLUMNS` results, per table.
    columns: Arc<dashmap::DashMap<String, Vec<String>>>,
}

impl Db {
    /// Connect to MySQL.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to MySQL: {}", e)))?;

        tracing::info!("Connected to MySQL");

        Ok(Self {
            pool: Some(pool),
            columns: Arc::new(dashmap::DashMap::new()),
        })
    }

    /// Create a mock handle for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            pool: None,
            columns: Arc::new(dashmap::DashMap::new()),
        }
    }

    /// Helper to get the pool or return an error if offline.
    pub(crate) fn pool(&self) -> Result<&MySqlPool, AppError> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    pub(crate) fn column_cache(&self) -> &dashmap::DashMap<String, Vec<String>> {
        &self.columns
    }
}

/// True if the error indicates a missing table or column.
pub(crate) fn is_schema_drift(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code();
            matches!(
                code.as_deref(),
                Some(ER_NO_SUCH_TABLE) | Some(ER_BAD_FIELD)
            )
        }
        _ => false,
    }
}

/// Degrade missing-table/column errors on reads to an empty result.
pub(crate) fn soft_empty<T>(
    result: Result<Vec<T>, sqlx::Error>,
    table: &str,
) -> Result<Vec<T>, AppError> {
    match result {
        Ok(rows) => Ok(rows),
        Err(err) if is_schema_drift(&err) => {
            tracing::warn!(table, error = %err, "Schema drift, returning empty result");
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// Degrade missing-table/column errors on single-row reads to `None`.
pub(crate) fn soft_none<T>(
    result: Result<Option<T>, sqlx::Error>,
    table: &str,
) -> Result<Option<T>, AppError> {
    match result {
        Ok(row) => Ok(row),
        Err(err) if is_schema_drift(&err) => {
            tracing::warn!(table, error = %err, "Schema drift, returning none");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

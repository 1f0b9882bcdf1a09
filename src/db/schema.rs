// SPDX-License-Identifier: MIT

//! Runtime schema probing for drift-tolerant inserts.
//!
//! Older deployments are missing newer columns (e.g. `recipes.cuisine`,
//! `subscriptions.gateway_reference`). Insert paths probe `SHOW COLUMNS`
//! once per table per process and only write columns that exist.

use super::Db;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::{MySql, Row};

/// A value headed for a dynamically-built insert.
#[derive(Debug, Clone)]
pub enum BindValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Str(String),
    OptStr(Option<String>),
    OptF64(Option<f64>),
    Json(serde_json::Value),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Bool(bool),
}

pub fn bind<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: BindValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        BindValue::U64(v) => query.bind(v),
        BindValue::I64(v) => query.bind(v),
        BindValue::F64(v) => query.bind(v),
        BindValue::Str(v) => query.bind(v),
        BindValue::OptStr(v) => query.bind(v),
        BindValue::OptF64(v) => query.bind(v),
        BindValue::Json(v) => query.bind(v),
        BindValue::DateTime(v) => query.bind(v),
        BindValue::Date(v) => query.bind(v),
        BindValue::Bool(v) => query.bind(v),
    }
}

impl Db {
    /// Column names for a table, probed once and cached for the process.
    pub async fn table_columns(&self, table: &str) -> Result<Vec<String>, AppError> {
        if let Some(cached) = self.column_cache().get(table) {
            return Ok(cached.clone());
        }

        let rows = sqlx::query(&format!("SHOW COLUMNS FROM `{}`", table))
            .fetch_all(self.pool()?)
            .await?;

        let columns: Vec<String> = rows
            .iter()
            .map(|row| row.get::<String, _>("Field"))
            .collect();

        self.column_cache()
            .insert(table.to_string(), columns.clone());
        Ok(columns)
    }

    /// Insert only the (column, value) pairs whose column exists in `table`.
    ///
    /// Returns the new row id. Pairs for missing columns are dropped with a
    /// warning, matching how the platform has always tolerated stale schemas.
    pub async fn insert_existing_columns(
        &self,
        table: &str,
        pairs: Vec<(&str, BindValue)>,
    ) -> Result<u64, AppError> {
        let existing = self.table_columns(table).await?;

        let (kept, dropped): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .partition(|(name, _)| existing.iter().any(|c| c == name));

        if !dropped.is_empty() {
            let names: Vec<&str> = dropped.iter().map(|(name, _)| *name).collect();
            tracing::warn!(table, columns = ?names, "Dropping values for missing columns");
        }

        if kept.is_empty() {
            return Err(AppError::Database(format!(
                "No insertable columns for table {}",
                table
            )));
        }

        let column_list: Vec<&str> = kept.iter().map(|(name, _)| *name).collect();
        let placeholders = vec!["?"; kept.len()].join(", ");
        let sql = format!(
            "INSERT INTO `{}` ({}) VALUES ({})",
            table,
            column_list
                .iter()
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in kept {
            query = bind(query, value);
        }

        let result = query.execute(self.pool()?).await?;
        Ok(result.last_insert_id())
    }
}

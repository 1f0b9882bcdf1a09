// SPDX-License-Identifier: MIT

//! Recipe models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation states stored in `recipes.status`.
pub const RECIPE_PENDING: &str = "pending";
pub const RECIPE_APPROVED: &str = "approved";
pub const RECIPE_REJECTED: &str = "rejected";

/// Recipe row.
///
/// Ingredients and instructions are stored as JSON arrays; the schema has
/// drifted over time so inserts only write columns that actually exist
/// (see `db::schema`).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    pub ingredients: serde_json::Value,
    pub instructions: serde_json::Value,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    /// 0 means the recipe is free
    pub price_cents: i64,
    /// "pending", "approved" or "rejected"
    pub status: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    pub fn is_approved(&self) -> bool {
        self.status == RECIPE_APPROVED
    }
}

/// Purchase of a paid recipe.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipePurchase {
    pub id: u64,
    pub recipe_id: u64,
    pub buyer_id: u64,
    pub amount_cents: i64,
    pub purchased_at: DateTime<Utc>,
}

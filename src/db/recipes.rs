// SPDX-License-Identifier: MIT

//! Recipe, purchase and favorite operations.

use super::schema::BindValue;
use super::{soft_empty, soft_none, Db};
use crate::error::AppError;
use crate::models::recipe::{Recipe, RecipePurchase, RECIPE_PENDING};
use crate::models::subscription::{PAYMENT_KIND_RECIPE, PAYMENT_SUCCESS};
use chrono::{DateTime, Utc};

/// Cursor for keyset pagination over recipes (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeQueryCursor {
    pub created_at: DateTime<Utc>,
    pub recipe_id: u64,
}

/// Filters for the public recipe listing.
#[derive(Debug, Default)]
pub struct RecipeFilter {
    pub status: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    /// Substring match on title
    pub search: Option<String>,
}

/// Input for creating or updating a recipe.
#[derive(Debug, Clone)]
pub struct NewRecipe {
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
    pub price_cents: i64,
}

impl Db {
    /// List recipes, newest first, with optional filters and keyset cursor.
    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        cursor: Option<RecipeQueryCursor>,
        limit: u32,
    ) -> Result<Vec<Recipe>, AppError> {
        let mut sql = String::from("SELECT * FROM recipes WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.cuisine.is_some() {
            sql.push_str(" AND cuisine = ?");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if filter.search.is_some() {
            sql.push_str(" AND title LIKE ?");
        }
        if cursor.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, Recipe>(&sql);
        if let Some(status) = &filter.status {
            query = query.bind(status);
        }
        if let Some(cuisine) = &filter.cuisine {
            query = query.bind(cuisine);
        }
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search));
        }
        if let Some(c) = cursor {
            query = query.bind(c.created_at).bind(c.created_at).bind(c.recipe_id);
        }
        query = query.bind(limit);

        soft_empty(query.fetch_all(self.pool()?).await, "recipes")
    }

    /// Get a single recipe.
    pub async fn get_recipe(&self, recipe_id: u64) -> Result<Option<Recipe>, AppError> {
        let result = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "recipes")
    }

    /// Recipes owned by a user (any status).
    pub async fn list_user_recipes(&self, user_id: u64) -> Result<Vec<Recipe>, AppError> {
        let result = sqlx::query_as::<_, Recipe>(
            "SELECT * FROM recipes WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "recipes")
    }

    /// Insert a recipe in pending state, tolerating stale schemas.
    pub async fn create_recipe(&self, new: NewRecipe) -> Result<u64, AppError> {
        self.insert_existing_columns(
            "recipes",
            vec![
                ("user_id", BindValue::U64(new.user_id)),
                ("title", BindValue::Str(new.title)),
                ("description", BindValue::OptStr(new.description)),
                ("cuisine", BindValue::OptStr(new.cuisine)),
                ("category", BindValue::OptStr(new.category)),
                ("ingredients", BindValue::Json(new.ingredients)),
                ("instructions", BindValue::Json(new.instructions)),
                ("calories", BindValue::OptF64(new.calories)),
                ("protein_g", BindValue::OptF64(new.protein_g)),
                ("carbs_g", BindValue::OptF64(new.carbs_g)),
                ("fat_g", BindValue::OptF64(new.fat_g)),
                ("price_cents", BindValue::I64(new.price_cents)),
                ("status", BindValue::Str(RECIPE_PENDING.to_string())),
                ("created_at", BindValue::DateTime(Utc::now())),
            ],
        )
        .await
    }

    /// Update an existing recipe and put it back into moderation.
    pub async fn update_recipe(&self, recipe_id: u64, new: NewRecipe) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE recipes SET title = ?, description = ?, cuisine = ?, category = ?, \
             ingredients = ?, instructions = ?, calories = ?, protein_g = ?, carbs_g = ?, \
             fat_g = ?, price_cents = ?, status = ?, rejection_reason = NULL, \
             updated_at = UTC_TIMESTAMP() WHERE id = ?",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.cuisine)
        .bind(&new.category)
        .bind(&new.ingredients)
        .bind(&new.instructions)
        .bind(new.calories)
        .bind(new.protein_g)
        .bind(new.carbs_g)
        .bind(new.fat_g)
        .bind(new.price_cents)
        .bind(RECIPE_PENDING)
        .bind(recipe_id)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    /// Set moderation status, with optional rejection reason.
    pub async fn set_recipe_status(
        &self,
        recipe_id: u64,
        status: &str,
        rejection_reason: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE recipes SET status = ?, rejection_reason = ?, updated_at = UTC_TIMESTAMP() \
             WHERE id = ?",
        )
        .bind(status)
        .bind(rejection_reason)
        .bind(recipe_id)
        .execute(self.pool()?)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Recipe {} not found",
                recipe_id
            )));
        }
        Ok(())
    }

    /// Delete a recipe and its favorites.
    pub async fn delete_recipe(&self, recipe_id: u64) -> Result<(), AppError> {
        let mut tx = self.pool()?.begin().await?;
        sqlx::query("DELETE FROM favorites WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ─── Purchases ───────────────────────────────────────────────

    /// Whether the user already bought the recipe.
    pub async fn has_purchased(&self, recipe_id: u64, buyer_id: u64) -> Result<bool, AppError> {
        let row: Option<(u64,)> = sqlx::query_as(
            "SELECT id FROM recipe_purchases WHERE recipe_id = ? AND buyer_id = ?",
        )
        .bind(recipe_id)
        .bind(buyer_id)
        .fetch_optional(self.pool()?)
        .await?;
        Ok(row.is_some())
    }

    /// Record a recipe purchase and its payment in one transaction.
    pub async fn record_purchase(
        &self,
        recipe_id: u64,
        buyer_id: u64,
        amount_cents: i64,
        currency: &str,
        reference: &str,
    ) -> Result<u64, AppError> {
        let mut tx = self.pool()?.begin().await?;

        sqlx::query(
            "INSERT INTO payments (user_id, kind, reference, amount_cents, currency, status, \
             created_at) VALUES (?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(buyer_id)
        .bind(PAYMENT_KIND_RECIPE)
        .bind(reference)
        .bind(amount_cents)
        .bind(currency)
        .bind(PAYMENT_SUCCESS)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "INSERT INTO recipe_purchases (recipe_id, buyer_id, amount_cents, purchased_at) \
             VALUES (?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(recipe_id)
        .bind(buyer_id)
        .bind(amount_cents)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.last_insert_id())
    }

    /// Purchases made by a user.
    pub async fn list_purchases(&self, buyer_id: u64) -> Result<Vec<RecipePurchase>, AppError> {
        let result = sqlx::query_as::<_, RecipePurchase>(
            "SELECT * FROM recipe_purchases WHERE buyer_id = ? ORDER BY purchased_at DESC",
        )
        .bind(buyer_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "recipe_purchases")
    }

    // ─── Favorites ───────────────────────────────────────────────

    /// Add a favorite; inserting twice is a no-op.
    pub async fn add_favorite(&self, user_id: u64, recipe_id: u64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT IGNORE INTO favorites (user_id, recipe_id, created_at) \
             VALUES (?, ?, UTC_TIMESTAMP())",
        )
        .bind(user_id)
        .bind(recipe_id)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    pub async fn remove_favorite(&self, user_id: u64, recipe_id: u64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
            .bind(user_id)
            .bind(recipe_id)
            .execute(self.pool()?)
            .await?;
        Ok(())
    }

    /// Favorited recipes for a user.
    pub async fn list_favorites(&self, user_id: u64) -> Result<Vec<Recipe>, AppError> {
        let result = sqlx::query_as::<_, Recipe>(
            "SELECT r.* FROM recipes r \
             JOIN favorites f ON f.recipe_id = r.id \
             WHERE f.user_id = ? ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "favorites")
    }
}

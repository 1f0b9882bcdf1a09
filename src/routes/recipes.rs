// SPDX-License-Identifier: MIT

//! Recipe routes: browsing, CRUD, purchase and favorites.

use crate::db::notifications::NewNotification;
use crate::db::recipes::{NewRecipe, RecipeFilter, RecipeQueryCursor};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::recipe::{Recipe, RecipePurchase, RECIPE_APPROVED};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/recipes/{id}/purchase", post(purchase_recipe))
        .route(
            "/api/recipes/{id}/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/api/favorites", get(list_favorites))
        .route("/api/my-recipes", get(list_my_recipes))
        .route("/api/purchases", get(list_my_purchases))
}

// ─── Cursor Codec ────────────────────────────────────────────

const MAX_PER_PAGE: u32 = 100;
const CURSOR_PARTS: usize = 3;

fn parse_cursor(cursor: Option<&str>) -> Result<Option<RecipeQueryCursor>> {
    cursor
        .map(|raw| {
            let invalid_cursor =
                || AppError::BadRequest("Invalid 'cursor' parameter".to_string());

            let decoded = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid_cursor())?;
            let decoded_str = std::str::from_utf8(&decoded).map_err(|_| invalid_cursor())?;

            let parts: Vec<&str> = decoded_str.split(':').collect();
            if parts.len() != CURSOR_PARTS {
                return Err(invalid_cursor());
            }

            let seconds = parts[0].parse::<i64>().map_err(|_| invalid_cursor())?;
            let nanos = parts[1].parse::<u32>().map_err(|_| invalid_cursor())?;
            let recipe_id = parts[2].parse::<u64>().map_err(|_| invalid_cursor())?;
            let created_at =
                chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(invalid_cursor)?;

            Ok(RecipeQueryCursor {
                created_at,
                recipe_id,
            })
        })
        .transpose()
}

fn encode_cursor(cursor: RecipeQueryCursor) -> String {
    let payload = format!(
        "{}:{}:{}",
        cursor.created_at.timestamp(),
        cursor.created_at.timestamp_subsec_nanos(),
        cursor.recipe_id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct RecipesQuery {
    cuisine: Option<String>,
    category: Option<String>,
    /// Substring match on title
    search: Option<String>,
    /// Cursor for forward pagination (opaque token).
    cursor: Option<String>,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

#[derive(Serialize)]
pub struct RecipesResponse {
    pub recipes: Vec<Recipe>,
    pub per_page: u32,
    pub next_cursor: Option<String>,
}

/// Browse approved recipes.
async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecipesQuery>,
) -> Result<Json<RecipesResponse>> {
    let limit = params.per_page.min(MAX_PER_PAGE);
    let cursor = parse_cursor(params.cursor.as_deref())?;

    let filter = RecipeFilter {
        status: Some(RECIPE_APPROVED.to_string()),
        cuisine: params.cuisine,
        category: params.category,
        search: params.search,
    };

    // Fetch one extra item to determine if another page is available.
    let fetch_limit = limit.saturating_add(1);
    let mut recipes = state.db.list_recipes(&filter, cursor, fetch_limit).await?;

    let has_more = recipes.len() > limit as usize;
    if has_more {
        recipes.truncate(limit as usize);
    }

    let next_cursor = if has_more {
        recipes.last().map(|r| {
            encode_cursor(RecipeQueryCursor {
                created_at: r.created_at,
                recipe_id: r.id,
            })
        })
    } else {
        None
    };

    Ok(Json(RecipesResponse {
        recipes,
        per_page: limit,
        next_cursor,
    }))
}

/// Recipe detail. Pending/rejected recipes are visible only to their owner
/// and to admins.
async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<Recipe>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    if !recipe.is_approved() && recipe.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::NotFound(format!("Recipe {} not found", id)));
    }
    Ok(Json(recipe))
}

/// Recipes owned by the current user, any status.
async fn list_my_recipes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Recipe>>> {
    Ok(Json(state.db.list_user_recipes(user.user_id).await?))
}

// ─── Create / Update / Delete ────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RecipePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub category: Option<String>,
    /// JSON array of ingredient strings/objects
    pub ingredients: serde_json::Value,
    /// JSON array of instruction steps
    pub instructions: serde_json::Value,
    #[validate(range(min = 0.0))]
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    /// 0 publishes the recipe for free
    #[validate(range(min = 0))]
    #[serde(default)]
    pub price_cents: i64,
}

impl RecipePayload {
    fn into_new(self, user_id: u64) -> NewRecipe {
        NewRecipe {
            user_id,
            title: self.title,
            description: self.description,
            cuisine: self.cuisine,
            category: self.category,
            ingredients: self.ingredients,
            instructions: self.instructions,
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            price_cents: self.price_cents,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: u64,
}

/// Submit a recipe; it enters the moderation queue as pending.
async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<CreatedResponse>> {
    payload.validate()?;

    if !payload.ingredients.is_array() || !payload.instructions.is_array() {
        return Err(AppError::BadRequest(
            "ingredients and instructions must be arrays".to_string(),
        ));
    }

    let id = state.db.create_recipe(payload.into_new(user.user_id)).await?;
    tracing::info!(recipe_id = id, user_id = user.user_id, "Recipe submitted");
    Ok(Json(CreatedResponse { id }))
}

/// Update own recipe; it re-enters moderation.
async fn update_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;

    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;
    if recipe.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    state
        .db
        .update_recipe(id, payload.into_new(user.user_id))
        .await?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// Delete own recipe (admins may delete any).
async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;
    if recipe.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    state.db.delete_recipe(id).await?;
    tracing::info!(recipe_id = id, user_id = user.user_id, "Recipe deleted");
    Ok(Json(serde_json::json!({"success": true})))
}

// ─── Purchase ────────────────────────────────────────────────

/// Purchase history for the current user.
async fn list_my_purchases(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RecipePurchase>>> {
    Ok(Json(state.db.list_purchases(user.user_id).await?))
}

#[derive(Serialize)]
pub struct PurchaseResponse {
    pub purchase_id: u64,
    pub amount_cents: i64,
}

/// Buy a paid recipe. Free recipes, own recipes and double purchases are
/// rejected.
async fn purchase_recipe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<PurchaseResponse>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    if !recipe.is_approved() {
        return Err(AppError::NotFound(format!("Recipe {} not found", id)));
    }
    if recipe.is_free() {
        return Err(AppError::BadRequest("Recipe is free".to_string()));
    }
    if recipe.user_id == user.user_id {
        return Err(AppError::BadRequest(
            "Cannot purchase your own recipe".to_string(),
        ));
    }
    if state.db.has_purchased(id, user.user_id).await? {
        return Err(AppError::BadRequest("Recipe already purchased".to_string()));
    }

    let reference = format!(
        "fs-recipe-{}-{}",
        user.user_id,
        chrono::Utc::now().timestamp_millis()
    );
    let purchase_id = state
        .db
        .record_purchase(
            id,
            user.user_id,
            recipe.price_cents,
            &state.config.currency,
            &reference,
        )
        .await?;

    let buyer_name = state
        .db
        .get_user(user.user_id)
        .await?
        .map(|u| u.name)
        .unwrap_or_else(|| "Someone".to_string());

    // Tell the author; a failed notification must not fail the purchase.
    if let Err(e) = state
        .notifier
        .notify(NewNotification {
            user_id: recipe.user_id,
            kind: "recipe_purchased".to_string(),
            actor_id: Some(user.user_id),
            actor_name: Some(buyer_name.clone()),
            object_type: Some("recipe".to_string()),
            object_id: Some(recipe.id),
            title: format!("{} purchased your recipe", buyer_name),
            body: Some(recipe.title.clone()),
        })
        .await
    {
        tracing::warn!(error = %e, "Purchase notification failed");
    }

    tracing::info!(
        recipe_id = id,
        buyer_id = user.user_id,
        amount_cents = recipe.price_cents,
        "Recipe purchased"
    );
    Ok(Json(PurchaseResponse {
        purchase_id,
        amount_cents: recipe.price_cents,
    }))
}

// ─── Favorites ───────────────────────────────────────────────

async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    let recipe = state
        .db
        .get_recipe(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {} not found", id)))?;

    state.db.add_favorite(user.user_id, id).await?;

    if recipe.user_id != user.user_id {
        let actor_name = state
            .db
            .get_user(user.user_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_else(|| "Someone".to_string());

        if let Err(e) = state
            .notifier
            .notify(NewNotification {
                user_id: recipe.user_id,
                kind: "recipe_favorited".to_string(),
                actor_id: Some(user.user_id),
                actor_name: Some(actor_name.clone()),
                object_type: Some("recipe".to_string()),
                object_id: Some(recipe.id),
                title: format!("{} favorited your recipe", actor_name),
                body: Some(recipe.title),
            })
            .await
        {
            tracing::warn!(error = %e, "Favorite notification failed");
        }
    }

    Ok(Json(serde_json::json!({"success": true})))
}

async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    state.db.remove_favorite(user.user_id, id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Recipe>>> {
    Ok(Json(state.db.list_favorites(user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursor = RecipeQueryCursor {
            created_at: chrono::DateTime::from_timestamp(1_704_103_200, 123).unwrap(),
            recipe_id: 42,
        };

        let encoded = encode_cursor(cursor);
        let decoded = parse_cursor(Some(&encoded)).unwrap().unwrap();

        assert_eq!(decoded.created_at, cursor.created_at);
        assert_eq!(decoded.recipe_id, cursor.recipe_id);
    }

    #[test]
    fn test_cursor_rejects_invalid_input() {
        let err = parse_cursor(Some("not-base64")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_cursor_rejects_wrong_part_count() {
        let encoded = URL_SAFE_NO_PAD.encode("1:2");
        let err = parse_cursor(Some(&encoded)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

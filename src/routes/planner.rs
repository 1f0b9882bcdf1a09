// SPDX-License-Identifier: MIT

//! Weekly meal plan and calendar event routes.

use crate::db::planner::{NewMealPlan, NewMealPlanDay, NewMealPlanMeal};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::planner::{CalendarEvent, MealPlan, MealPlanDay, MealPlanMeal};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/meal-plans", get(list_meal_plans).post(create_meal_plan))
        .route(
            "/api/meal-plans/{id}",
            get(get_meal_plan).delete(delete_meal_plan),
        )
        .route(
            "/api/calendar-events",
            get(list_events).post(create_event),
        )
        .route(
            "/api/calendar-events/{id}",
            axum::routing::put(update_event).delete(delete_event),
        )
}

// ─── Meal Plans ──────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct MealPlanPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub days: Vec<MealPlanDayPayload>,
}

#[derive(Deserialize)]
pub struct MealPlanDayPayload {
    pub day_of_week: u8,
    #[serde(default)]
    pub meals: Vec<MealPlanMealPayload>,
}

#[derive(Deserialize)]
pub struct MealPlanMealPayload {
    pub meal_type: String,
    pub recipe_id: Option<u64>,
    pub title: String,
    pub calories: Option<f64>,
}

async fn create_meal_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<MealPlanPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    if payload.days.iter().any(|d| d.day_of_week > 6) {
        return Err(AppError::BadRequest(
            "day_of_week must be 0..=6".to_string(),
        ));
    }

    let new = NewMealPlan {
        name: payload.name,
        week_start: payload.week_start,
        days: payload
            .days
            .into_iter()
            .map(|d| NewMealPlanDay {
                day_of_week: d.day_of_week,
                meals: d
                    .meals
                    .into_iter()
                    .map(|m| NewMealPlanMeal {
                        meal_type: m.meal_type,
                        recipe_id: m.recipe_id,
                        title: m.title,
                        calories: m.calories,
                    })
                    .collect(),
            })
            .collect(),
    };

    let id = state.db.create_meal_plan(user.user_id, new).await?;
    tracing::info!(meal_plan_id = id, user_id = user.user_id, "Meal plan created");
    Ok(Json(serde_json::json!({"id": id})))
}

async fn list_meal_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MealPlan>>> {
    Ok(Json(state.db.list_meal_plans(user.user_id).await?))
}

#[derive(Serialize)]
pub struct MealPlanDetail {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub days: Vec<MealPlanDay>,
    pub meals: Vec<MealPlanMeal>,
}

async fn get_meal_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<MealPlanDetail>> {
    let plan = owned_meal_plan(&state, id, user.user_id).await?;
    let (days, meals) = state.db.meal_plan_contents(id).await?;
    Ok(Json(MealPlanDetail { plan, days, meals }))
}

async fn delete_meal_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    owned_meal_plan(&state, id, user.user_id).await?;
    state.db.delete_meal_plan(id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

async fn owned_meal_plan(state: &AppState, plan_id: u64, user_id: u64) -> Result<MealPlan> {
    let plan = state
        .db
        .get_meal_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Meal plan {} not found", plan_id)))?;
    if plan.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(plan)
}

// ─── Calendar Events ─────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct EventPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// "meal", "workout" or "reminder"
    #[validate(length(min = 1, max = 20))]
    pub kind: String,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    let id = state
        .db
        .create_calendar_event(
            user.user_id,
            &payload.title,
            &payload.kind,
            payload.event_date,
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(serde_json::json!({"id": id})))
}

#[derive(Deserialize)]
struct EventsQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<Vec<CalendarEvent>>> {
    Ok(Json(
        state
            .db
            .list_calendar_events(user.user_id, params.from, params.to)
            .await?,
    ))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    owned_event(&state, id, user.user_id).await?;
    state
        .db
        .update_calendar_event(
            id,
            &payload.title,
            &payload.kind,
            payload.event_date,
            payload.notes.as_deref(),
        )
        .await?;
    Ok(Json(serde_json::json!({"success": true})))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    owned_event(&state, id, user.user_id).await?;
    state.db.delete_calendar_event(id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

async fn owned_event(state: &AppState, event_id: u64, user_id: u64) -> Result<CalendarEvent> {
    let event = state
        .db
        .get_calendar_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;
    if event.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(event)
}

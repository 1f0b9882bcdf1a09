// SPDX-License-Identifier: MIT

//! Diet plan, meal log and hydration routes.

use crate::db::diet::NewDietPlan;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::diet::{DietPlan, DietPlanLog, HydrationLog, GOAL_GAIN, GOAL_LOSE, GOAL_MAINTAIN};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/diet/plans", get(list_plans).post(create_plan))
        .route("/api/diet/plans/{id}", put(update_plan).delete(delete_plan))
        .route(
            "/api/diet/plans/{id}/logs",
            get(list_logs).post(add_log),
        )
        .route("/api/hydration", get(hydration_day).post(add_hydration))
}

// ─── Plans ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct DietPlanPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// "lose", "maintain" or "gain"
    pub goal: String,
    #[validate(range(min = 500.0, max = 10000.0))]
    pub daily_calorie_target: f64,
    pub protein_target_g: Option<f64>,
    pub carbs_target_g: Option<f64>,
    pub fat_target_g: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl DietPlanPayload {
    fn validate_goal(&self) -> Result<()> {
        match self.goal.as_str() {
            GOAL_LOSE | GOAL_MAINTAIN | GOAL_GAIN => Ok(()),
            other => Err(AppError::BadRequest(format!("Unknown goal: {}", other))),
        }
    }

    fn into_new(self) -> NewDietPlan {
        NewDietPlan {
            name: self.name,
            goal: self.goal,
            daily_calorie_target: self.daily_calorie_target,
            protein_target_g: self.protein_target_g,
            carbs_target_g: self.carbs_target_g,
            fat_target_g: self.fat_target_g,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

async fn create_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<DietPlanPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    payload.validate_goal()?;

    let active = payload.active;
    let id = state
        .db
        .create_diet_plan(user.user_id, &payload.into_new(), active)
        .await?;
    tracing::info!(plan_id = id, user_id = user.user_id, "Diet plan created");
    Ok(Json(serde_json::json!({"id": id})))
}

async fn list_plans(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<DietPlan>>> {
    Ok(Json(state.db.list_diet_plans(user.user_id).await?))
}

async fn update_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(payload): Json<DietPlanPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    payload.validate_goal()?;

    owned_plan(&state, id, user.user_id).await?;
    let active = payload.active;
    state
        .db
        .update_diet_plan(id, user.user_id, &payload.into_new(), active)
        .await?;
    Ok(Json(serde_json::json!({"success": true})))
}

async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>> {
    owned_plan(&state, id, user.user_id).await?;
    state.db.delete_diet_plan(id).await?;
    Ok(Json(serde_json::json!({"success": true})))
}

/// Fetch a plan, verifying ownership.
async fn owned_plan(state: &AppState, plan_id: u64, user_id: u64) -> Result<DietPlan> {
    let plan = state
        .db
        .get_diet_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Diet plan {} not found", plan_id)))?;
    if plan.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(plan)
}

// ─── Meal Logs ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct MealLogPayload {
    pub log_date: NaiveDate,
    /// "breakfast", "lunch", "dinner" or "snack"
    #[validate(length(min = 1, max = 20))]
    pub meal_type: String,
    #[validate(length(min = 1, max = 300))]
    pub description: String,
    #[validate(range(min = 0.0, max = 10000.0))]
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

async fn add_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Json(payload): Json<MealLogPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    owned_plan(&state, id, user.user_id).await?;

    let log_id = state
        .db
        .add_diet_log(
            id,
            payload.log_date,
            &payload.meal_type,
            &payload.description,
            payload.calories,
            payload.protein_g,
            payload.carbs_g,
            payload.fat_g,
        )
        .await?;
    Ok(Json(serde_json::json!({"id": log_id})))
}

#[derive(Deserialize)]
struct DayQuery {
    date: NaiveDate,
}

/// Daily totals measured against the plan's targets.
#[derive(Serialize)]
pub struct DaySummary {
    pub logs: Vec<DietPlanLog>,
    pub total_calories: f64,
    pub total_protein_g: f64,
    pub total_carbs_g: f64,
    pub total_fat_g: f64,
    /// Calories still available under the plan target (negative when over)
    pub remaining_calories: f64,
}

pub(crate) fn summarize(plan: &DietPlan, logs: Vec<DietPlanLog>) -> DaySummary {
    let total_calories: f64 = logs.iter().map(|l| l.calories).sum();
    let total_protein_g: f64 = logs.iter().filter_map(|l| l.protein_g).sum();
    let total_carbs_g: f64 = logs.iter().filter_map(|l| l.carbs_g).sum();
    let total_fat_g: f64 = logs.iter().filter_map(|l| l.fat_g).sum();

    DaySummary {
        remaining_calories: plan.daily_calorie_target - total_calories,
        logs,
        total_calories,
        total_protein_g,
        total_carbs_g,
        total_fat_g,
    }
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<u64>,
    Query(params): Query<DayQuery>,
) -> Result<Json<DaySummary>> {
    let plan = owned_plan(&state, id, user.user_id).await?;
    let logs = state.db.list_diet_logs(id, params.date).await?;
    Ok(Json(summarize(&plan, logs)))
}

// ─── Hydration ───────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct HydrationPayload {
    pub log_date: NaiveDate,
    #[validate(range(min = 1, max = 5000))]
    pub amount_ml: i64,
}

async fn add_hydration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<HydrationPayload>,
) -> Result<Json<serde_json::Value>> {
    payload.validate()?;
    let id = state
        .db
        .add_hydration(user.user_id, payload.log_date, payload.amount_ml)
        .await?;
    Ok(Json(serde_json::json!({"id": id})))
}

#[derive(Serialize)]
pub struct HydrationDayResponse {
    pub logs: Vec<HydrationLog>,
    pub total_ml: i64,
}

async fn hydration_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DayQuery>,
) -> Result<Json<HydrationDayResponse>> {
    let logs = state.db.list_hydration(user.user_id, params.date).await?;
    let total_ml = logs.iter().map(|l| l.amount_ml).sum();
    Ok(Json(HydrationDayResponse { logs, total_ml }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plan(target: f64) -> DietPlan {
        DietPlan {
            id: 1,
            user_id: 1,
            name: "Cut".to_string(),
            goal: GOAL_LOSE.to_string(),
            daily_calorie_target: target,
            protein_target_g: Some(150.0),
            carbs_target_g: None,
            fat_target_g: None,
            start_date: None,
            end_date: None,
            active: true,
        }
    }

    fn log(calories: f64, protein: Option<f64>) -> DietPlanLog {
        DietPlanLog {
            id: 1,
            plan_id: 1,
            log_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            meal_type: "lunch".to_string(),
            description: "salad".to_string(),
            calories,
            protein_g: protein,
            carbs_g: None,
            fat_g: None,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = summarize(&plan(2000.0), vec![log(600.0, Some(40.0)), log(450.0, None)]);
        assert_eq!(summary.total_calories, 1050.0);
        assert_eq!(summary.total_protein_g, 40.0);
        assert_eq!(summary.remaining_calories, 950.0);
    }

    #[test]
    fn test_summary_over_target_goes_negative() {
        let summary = summarize(&plan(1000.0), vec![log(1300.0, None)]);
        assert_eq!(summary.remaining_calories, -300.0);
    }

    #[test]
    fn test_summary_empty_day() {
        let summary = summarize(&plan(1800.0), vec![]);
        assert_eq!(summary.total_calories, 0.0);
        assert_eq!(summary.remaining_calories, 1800.0);
    }
}

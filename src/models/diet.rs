// SPDX-License-Identifier: MIT

//! Diet plan, meal log and hydration models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Goals stored in `diet_plans.goal`.
pub const GOAL_LOSE: &str = "lose";
pub const GOAL_MAINTAIN: &str = "maintain";
pub const GOAL_GAIN: &str = "gain";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DietPlan {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    /// "lose", "maintain" or "gain"
    pub goal: String,
    pub daily_calorie_target: f64,
    pub protein_target_g: Option<f64>,
    pub carbs_target_g: Option<f64>,
    pub fat_target_g: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// At most one active plan per user
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DietPlanLog {
    pub id: u64,
    pub plan_id: u64,
    pub log_date: NaiveDate,
    /// "breakfast", "lunch", "dinner" or "snack"
    pub meal_type: String,
    pub description: String,
    pub calories: f64,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HydrationLog {
    pub id: u64,
    pub user_id: u64,
    pub log_date: NaiveDate,
    pub amount_ml: i64,
    pub logged_at: DateTime<Utc>,
}

// SPDX-License-Identifier: MIT

//! Weekly meal plans and calendar events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MealPlan {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    pub week_start: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MealPlanDay {
    pub id: u64,
    pub meal_plan_id: u64,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MealPlanMeal {
    pub id: u64,
    pub day_id: u64,
    /// "breakfast", "lunch", "dinner" or "snack"
    pub meal_type: String,
    /// Optional link to a recipe
    pub recipe_id: Option<u64>,
    pub title: String,
    pub calories: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalendarEvent {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    /// "meal", "workout", "reminder"
    pub kind: String,
    pub event_date: NaiveDate,
    pub notes: Option<String>,
}

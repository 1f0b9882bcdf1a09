// SPDX-License-Identifier: MIT

//! Diet plan, meal log and hydration operations.

use super::{soft_empty, soft_none, Db};
use crate::error::AppError;
use crate::models::diet::{DietPlan, DietPlanLog, HydrationLog};
use chrono::NaiveDate;

/// Input for creating or updating a diet plan.
#[derive(Debug, Clone)]
pub struct NewDietPlan {
    pub name: String,
    pub goal: String,
    pub daily_calorie_target: f64,
    pub protein_target_g: Option<f64>,
    pub carbs_target_g: Option<f64>,
    pub fat_target_g: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Db {
    /// Create a plan; activating it deactivates any other active plan.
    pub async fn create_diet_plan(
        &self,
        user_id: u64,
        new: &NewDietPlan,
        active: bool,
    ) -> Result<u64, AppError> {
        let mut tx = self.pool()?.begin().await?;

        if active {
            sqlx::query("UPDATE diet_plans SET active = 0 WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query(
            "INSERT INTO diet_plans (user_id, name, goal, daily_calorie_target, \
             protein_target_g, carbs_target_g, fat_target_g, start_date, end_date, active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.goal)
        .bind(new.daily_calorie_target)
        .bind(new.protein_target_g)
        .bind(new.carbs_target_g)
        .bind(new.fat_target_g)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(active)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.last_insert_id())
    }

    pub async fn list_diet_plans(&self, user_id: u64) -> Result<Vec<DietPlan>, AppError> {
        let result = sqlx::query_as::<_, DietPlan>(
            "SELECT * FROM diet_plans WHERE user_id = ? ORDER BY active DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "diet_plans")
    }

    pub async fn get_diet_plan(&self, plan_id: u64) -> Result<Option<DietPlan>, AppError> {
        let result = sqlx::query_as::<_, DietPlan>("SELECT * FROM diet_plans WHERE id = ?")
            .bind(plan_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "diet_plans")
    }

    pub async fn update_diet_plan(
        &self,
        plan_id: u64,
        user_id: u64,
        new: &NewDietPlan,
        active: bool,
    ) -> Result<(), AppError> {
        let mut tx = self.pool()?.begin().await?;

        if active {
            sqlx::query("UPDATE diet_plans SET active = 0 WHERE user_id = ? AND id <> ?")
                .bind(user_id)
                .bind(plan_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE diet_plans SET name = ?, goal = ?, daily_calorie_target = ?, \
             protein_target_g = ?, carbs_target_g = ?, fat_target_g = ?, start_date = ?, \
             end_date = ?, active = ? WHERE id = ?",
        )
        .bind(&new.name)
        .bind(&new.goal)
        .bind(new.daily_calorie_target)
        .bind(new.protein_target_g)
        .bind(new.carbs_target_g)
        .bind(new.fat_target_g)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(active)
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete a plan and its logs.
    pub async fn delete_diet_plan(&self, plan_id: u64) -> Result<(), AppError> {
        let mut tx = self.pool()?.begin().await?;
        sqlx::query("DELETE FROM diet_plan_logs WHERE plan_id = ?")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM diet_plans WHERE id = ?")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ─── Meal Logs ───────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub async fn add_diet_log(
        &self,
        plan_id: u64,
        log_date: NaiveDate,
        meal_type: &str,
        description: &str,
        calories: f64,
        protein_g: Option<f64>,
        carbs_g: Option<f64>,
        fat_g: Option<f64>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO diet_plan_logs (plan_id, log_date, meal_type, description, calories, \
             protein_g, carbs_g, fat_g, logged_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(plan_id)
        .bind(log_date)
        .bind(meal_type)
        .bind(description)
        .bind(calories)
        .bind(protein_g)
        .bind(carbs_g)
        .bind(fat_g)
        .execute(self.pool()?)
        .await?;
        Ok(result.last_insert_id())
    }

    /// Logs for one plan on one day.
    pub async fn list_diet_logs(
        &self,
        plan_id: u64,
        log_date: NaiveDate,
    ) -> Result<Vec<DietPlanLog>, AppError> {
        let result = sqlx::query_as::<_, DietPlanLog>(
            "SELECT * FROM diet_plan_logs WHERE plan_id = ? AND log_date = ? ORDER BY logged_at",
        )
        .bind(plan_id)
        .bind(log_date)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "diet_plan_logs")
    }

    // ─── Hydration ───────────────────────────────────────────────

    pub async fn add_hydration(
        &self,
        user_id: u64,
        log_date: NaiveDate,
        amount_ml: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO hydration_logs (user_id, log_date, amount_ml, logged_at) \
             VALUES (?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(user_id)
        .bind(log_date)
        .bind(amount_ml)
        .execute(self.pool()?)
        .await?;
        Ok(result.last_insert_id())
    }

    pub async fn list_hydration(
        &self,
        user_id: u64,
        log_date: NaiveDate,
    ) -> Result<Vec<HydrationLog>, AppError> {
        let result = sqlx::query_as::<_, HydrationLog>(
            "SELECT * FROM hydration_logs WHERE user_id = ? AND log_date = ? ORDER BY logged_at",
        )
        .bind(user_id)
        .bind(log_date)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "hydration_logs")
    }
}

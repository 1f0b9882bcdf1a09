// SPDX-License-Identifier: MIT

//! Meal plan and calendar event operations.

use super::{soft_empty, soft_none, Db};
use crate::error::AppError;
use crate::models::planner::{CalendarEvent, MealPlan, MealPlanDay, MealPlanMeal};
use chrono::NaiveDate;

/// Nested input for creating a meal plan in one request.
#[derive(Debug, Clone)]
pub struct NewMealPlan {
    pub name: String,
    pub week_start: NaiveDate,
    pub days: Vec<NewMealPlanDay>,
}

#[derive(Debug, Clone)]
pub struct NewMealPlanDay {
    pub day_of_week: u8,
    pub meals: Vec<NewMealPlanMeal>,
}

#[derive(Debug, Clone)]
pub struct NewMealPlanMeal {
    pub meal_type: String,
    pub recipe_id: Option<u64>,
    pub title: String,
    pub calories: Option<f64>,
}

impl Db {
    /// Create a plan with all its days and meals in one transaction.
    pub async fn create_meal_plan(&self, user_id: u64, new: NewMealPlan) -> Result<u64, AppError> {
        let mut tx = self.pool()?.begin().await?;

        let plan = sqlx::query(
            "INSERT INTO meal_plans (user_id, name, week_start, created_at) \
             VALUES (?, ?, ?, UTC_TIMESTAMP())",
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(new.week_start)
        .execute(&mut *tx)
        .await?;
        let plan_id = plan.last_insert_id();

        for day in &new.days {
            let day_row =
                sqlx::query("INSERT INTO meal_plan_days (meal_plan_id, day_of_week) VALUES (?, ?)")
                    .bind(plan_id)
                    .bind(day.day_of_week)
                    .execute(&mut *tx)
                    .await?;
            let day_id = day_row.last_insert_id();

            for meal in &day.meals {
                sqlx::query(
                    "INSERT INTO meal_plan_meals (day_id, meal_type, recipe_id, title, calories) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(day_id)
                .bind(&meal.meal_type)
                .bind(meal.recipe_id)
                .bind(&meal.title)
                .bind(meal.calories)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(plan_id)
    }

    pub async fn list_meal_plans(&self, user_id: u64) -> Result<Vec<MealPlan>, AppError> {
        let result = sqlx::query_as::<_, MealPlan>(
            "SELECT * FROM meal_plans WHERE user_id = ? ORDER BY week_start DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await;
        soft_empty(result, "meal_plans")
    }

    pub async fn get_meal_plan(&self, plan_id: u64) -> Result<Option<MealPlan>, AppError> {
        let result = sqlx::query_as::<_, MealPlan>("SELECT * FROM meal_plans WHERE id = ?")
            .bind(plan_id)
            .fetch_optional(self.pool()?)
            .await;
        soft_none(result, "meal_plans")
    }

    /// Days and meals for a plan.
    pub async fn meal_plan_contents(
        &self,
        plan_id: u64,
    ) -> Result<(Vec<MealPlanDay>, Vec<MealPlanMeal>), AppError> {
        let days = soft_empty(
            sqlx::query_as::<_, MealPlanDay>(
                "SELECT * FROM meal_plan_days WHERE meal_plan_id = ? ORDER BY day_of_week",
            )
            .bind(plan_id)
            .fetch_all(self.pool()?)
            .await,
            "meal_plan_days",
        )?;

        let meals = soft_empty(
            sqlx::query_as::<_, MealPlanMeal>(
                "SELECT m.* FROM meal_plan_meals m \
                 JOIN meal_plan_days d ON d.id = m.day_id WHERE d.meal_plan_id = ? \
                 ORDER BY m.id",
            )
            .bind(plan_id)
            .fetch_all(self.pool()?)
            .await,
            "meal_plan_meals",
        )?;

        Ok((days, meals))
    }

    /// Delete a plan with its days and meals.
    pub async fn delete_meal_plan(&self, plan_id: u64) -> Result<(), AppError> {
        let mut tx = self.pool()?.begin().await?;
        sqlx::query(
            "DELETE m FROM meal_plan_meals m \
             JOIN meal_plan_days d ON d.id = m.day_id WHERE d.meal_plan_id = ?",
        )
        .bind(plan_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM meal_plan_days WHERE meal_plan_id = ?")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM meal_plans WHERE id = ?")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ─── Calendar Events ─────────────────────────────────────────

    pub async fn create_calendar_event(
        &self,
        user_id: u64,
        title: &str,
        kind: &str,
        event_date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "INSERT INTO calendar_events (user_id, title, kind, event_date, notes) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(kind)
        .bind(event_date)
        .bind(notes)
        .execute(self.pool()?)
        .await?;
        Ok(result.last_insert_id())
    }

    /// Events for a user within an optional date window.
    pub async fn list_calendar_events(
        &self,
        user_id: u64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let mut sql = String::from("SELECT * FROM calendar_events WHERE user_id = ?");
        if from.is_some() {
            sql.push_str(" AND event_date >= ?");
        }
        if to.is_some() {
            sql.push_str(" AND event_date <= ?");
        }
        sql.push_str(" ORDER BY event_date");

        let mut query = sqlx::query_as::<_, CalendarEvent>(&sql).bind(user_id);
        if let Some(from) = from {
            query = query.bind(from);
        }
        if let Some(to) = to {
            query = query.bind(to);
        }

        soft_empty(query.fetch_all(self.pool()?).await, "calendar_events")
    }

    pub async fn get_calendar_event(
        &self,
        event_id: u64,
    ) -> Result<Option<CalendarEvent>, AppError> {
        let result =
            sqlx::query_as::<_, CalendarEvent>("SELECT * FROM calendar_events WHERE id = ?")
                .bind(event_id)
                .fetch_optional(self.pool()?)
                .await;
        soft_none(result, "calendar_events")
    }

    pub async fn update_calendar_event(
        &self,
        event_id: u64,
        title: &str,
        kind: &str,
        event_date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE calendar_events SET title = ?, kind = ?, event_date = ?, notes = ? \
             WHERE id = ?",
        )
        .bind(title)
        .bind(kind)
        .bind(event_date)
        .bind(notes)
        .bind(event_id)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }

    pub async fn delete_calendar_event(&self, event_id: u64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM calendar_events WHERE id = ?")
            .bind(event_id)
            .execute(self.pool()?)
            .await?;
        Ok(())
    }
}

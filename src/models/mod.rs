// SPDX-License-Identifier: MIT

//! Domain models shared between the database layer and API responses.

pub mod chat;
pub mod diet;
pub mod notification;
pub mod planner;
pub mod recipe;
pub mod subscription;
pub mod user;

pub use chat::{ChatMessage, ConversationSummary};
pub use diet::{DietPlan, DietPlanLog, HydrationLog};
pub use notification::{AggregatedNotification, Notification};
pub use planner::{CalendarEvent, MealPlan, MealPlanDay, MealPlanMeal};
pub use recipe::{Recipe, RecipePurchase};
pub use subscription::{Payment, Subscription, SubscriptionPlan, SubscriptionRefund};
pub use user::User;

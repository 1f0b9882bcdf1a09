// SPDX-License-Identifier: MIT

//! FitSavory: recipe, nutrition and fitness platform backend.
//!
//! This crate provides the JSON API for user recipes, admin moderation,
//! subscriptions and payments, diet tracking, notifications and chat,
//! plus the WebSocket push channel used for real-time delivery.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{NotifierService, PaymentGateway, PushService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub push: Arc<PushService>,
    pub gateway: PaymentGateway,
    pub notifier: NotifierService,
}

// SPDX-License-Identifier: MIT

//! FitSavory API Server
//!
//! Serves the recipe, nutrition and fitness platform API: recipes with
//! moderation, subscriptions and payments, diet tracking, notifications,
//! chat and the WebSocket push channel.

use fitsavory::{
    config::Config,
    db::Db,
    services::{NotifierService, PaymentGateway, PushService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FitSavory API");

    // Connect to MySQL
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database pool initialized");

    // In-process WebSocket registry
    let push = Arc::new(PushService::new());

    // Payment gateway client
    let gateway = PaymentGateway::new(config.gateway_secret_key.clone());
    tracing::info!("Payment gateway client initialized");

    let notifier = NotifierService::new(db.clone(), push.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        push,
        gateway,
        notifier,
    });

    // Build router
    let app = fitsavory::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitsavory=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

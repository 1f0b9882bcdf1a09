// SPDX-License-Identifier: MIT

//! Administrative broadcast tool.
//!
//! Inserts a broadcast notification for every active user and asks the
//! running API server to push it to connected clients through the signed
//! internal endpoint.
//!
//! Usage: fitsavory-broadcast <title> [body]

use fitsavory::config::{Config, PUSH_SIGNATURE_HEADER};
use fitsavory::db::Db;
use fitsavory::middleware::push_auth::sign_push_body;
use fitsavory::services::{NotifierService, PushService};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let title = match args.next() {
        Some(title) => title,
        None => {
            eprintln!("Usage: fitsavory-broadcast <title> [body]");
            std::process::exit(2);
        }
    };
    let body = args.next();

    let config = Config::from_env().expect("Failed to load configuration");
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let user_ids = db.active_user_ids().await?;
    tracing::info!(count = user_ids.len(), "Broadcasting to active users");

    // This process has no live connections; the notifier only stores rows
    // here, and delivery is handed to the API server below.
    let notifier = NotifierService::new(db, Arc::new(PushService::new()));
    let created = notifier.broadcast(&user_ids, &title, body.as_deref()).await?;
    tracing::info!(created, "Broadcast notifications stored");

    // Hand delivery to the API server, which owns the live connections.
    let payload = serde_json::json!({
        "user_ids": user_ids,
        "event": "broadcast",
        "payload": {"title": title, "body": body},
    });
    let raw = serde_json::to_vec(&payload)?;
    let signature = sign_push_body(&config.push_shared_secret, &raw);

    let url = format!("http://127.0.0.1:{}/internal/push", config.port);
    let response = reqwest::Client::new()
        .post(&url)
        .header(PUSH_SIGNATURE_HEADER, signature)
        .header("content-type", "application/json")
        .body(raw)
        .send()
        .await;

    match response {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Push delivery requested");
        }
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "Push endpoint rejected request");
        }
        Err(err) => {
            tracing::warn!(error = %err, "API server unreachable, rows stored without push");
        }
    }

    Ok(())
}

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

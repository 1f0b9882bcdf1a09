// SPDX-License-Identifier: MIT

use fitsavory::config::Config;
use fitsavory::db::Db;
use fitsavory::middleware::auth::create_jwt;
use fitsavory::routes::create_router;
use fitsavory::services::{NotifierService, PaymentGateway, PushService};
use fitsavory::AppState;
use std::sync::Arc;

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> Db {
    Db::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let push = Arc::new(PushService::new());
    let gateway = PaymentGateway::new_mock();
    let notifier = NotifierService::new(db.clone(), push.clone());

    let state = Arc::new(AppState {
        config,
        db,
        push,
        gateway,
        notifier,
    });

    (create_router(state.clone()), state)
}

/// Session token for a regular user.
#[allow(dead_code)]
pub fn user_token(state: &AppState, user_id: u64) -> String {
    create_jwt(user_id, "user", &state.config.jwt_signing_key).expect("JWT creation")
}

/// Session token with the admin role.
#[allow(dead_code)]
pub fn admin_token(state: &AppState, user_id: u64) -> String {
    create_jwt(user_id, "admin", &state.config.jwt_signing_key).expect("JWT creation")
}

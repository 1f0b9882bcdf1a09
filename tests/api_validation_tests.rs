// SPDX-License-Identifier: MIT

//! Request validation tests.
//!
//! Handlers validate payloads before touching the database, so the
//! offline mock app still exercises every rejection path.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn json_post(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Alice",
                        "email": "not-an-email",
                        "password": "password123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "name": "Alice",
                        "email": "alice@example.com",
                        "password": "short"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_hydration_rejects_out_of_range_amount() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(json_post(
            "/api/hydration",
            &token,
            serde_json::json!({"log_date": "2026-08-30", "amount_ml": 50000}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_diet_plan_rejects_unknown_goal() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(json_post(
            "/api/diet/plans",
            &token,
            serde_json::json!({
                "name": "Cut",
                "goal": "bulk-to-the-moon",
                "daily_calorie_target": 2000.0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recipe_create_rejects_non_array_ingredients() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(json_post(
            "/api/recipes",
            &token,
            serde_json::json!({
                "title": "Toast",
                "description": "Bread, but warm",
                "cuisine": "other",
                "category": "breakfast",
                "ingredients": "bread",
                "instructions": ["toast it"],
                "price_cents": 0
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_meal_plan_rejects_bad_day_of_week() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(json_post(
            "/api/meal-plans",
            &token,
            serde_json::json!({
                "name": "Week 1",
                "week_start": "2026-08-31",
                "days": [{"day_of_week": 9, "meals": []}]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_self_conversation() {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(json_post(
            "/api/chat/conversations",
            &token,
            serde_json::json!({"user_id": 42}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_reject_requires_reason() {
    let (app, state) = common::create_test_app();
    let token = common::admin_token(&state, 1);

    let response = app
        .oneshot(json_post(
            "/api/admin/recipes/5/reject",
            &token,
            serde_json::json!({"reason": ""}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

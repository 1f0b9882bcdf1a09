// SPDX-License-Identifier: MIT

//! Internal push endpoint and WebSocket handshake security.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use fitsavory::config::PUSH_SIGNATURE_HEADER;
use fitsavory::middleware::push_auth::sign_push_body;
use tower::ServiceExt;

mod common;

fn push_request(signature: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/internal/push")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sig) = signature {
        builder = builder.header(PUSH_SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_push_without_signature() {
    let (app, _) = common::create_test_app();

    let body = r#"{"user_ids":[1],"event":"broadcast","payload":{}}"#;
    let response = app.oneshot(push_request(None, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_push_with_wrong_secret() {
    let (app, _) = common::create_test_app();

    let body = r#"{"user_ids":[1],"event":"broadcast","payload":{}}"#;
    let signature = sign_push_body(b"wrong_secret", body.as_bytes());
    let response = app
        .oneshot(push_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_push_with_valid_signature() {
    let (app, state) = common::create_test_app();

    let body = r#"{"user_ids":[1,2],"event":"broadcast","payload":{"title":"hi"}}"#;
    let signature = sign_push_body(&state.config.push_shared_secret, body.as_bytes());
    let response = app
        .oneshot(push_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    // Nobody is connected, so nothing is delivered
    assert_eq!(parsed["delivered"], 0);
}

#[tokio::test]
async fn test_push_delivers_to_registered_client() {
    let (app, state) = common::create_test_app();
    let (_conn_id, mut rx) = state.push.register(7);

    let body = r#"{"user_ids":[7],"event":"broadcast","payload":{"title":"hi"}}"#;
    let signature = sign_push_body(&state.config.push_shared_secret, body.as_bytes());
    let response = app
        .oneshot(push_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let frame = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["event"], "broadcast");
    assert_eq!(parsed["payload"]["title"], "hi");
}

#[tokio::test]
async fn test_push_rejects_signed_garbage_body() {
    let (app, state) = common::create_test_app();

    let body = "not json";
    let signature = sign_push_body(&state.config.push_shared_secret, body.as_bytes());
    let response = app
        .oneshot(push_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ws_upgrade_rejects_bad_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/ws?token=invalid.token.here")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_upgrade_requires_token_param() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/ws")
                .header(header::CONNECTION, "upgrade")
                .header(header::UPGRADE, "websocket")
                .header(header::SEC_WEBSOCKET_VERSION, "13")
                .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// SPDX-License-Identifier: MIT

//! Payment gateway webhook signature checks.
//!
//! The webhook body is authenticated with HMAC-SHA256 over the raw bytes;
//! anything that fails verification is a 403 before the body is parsed.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

mod common;

fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook_request(signature: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/payments/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(sig) = signature {
        builder = builder.header("x-gateway-signature", sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_webhook_without_signature() {
    let (app, _) = common::create_test_app();

    let body = r#"{"event":"charge.success","data":{"reference":"fs-sub-1-1"}}"#;
    let response = app.oneshot(webhook_request(None, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_with_wrong_signature() {
    let (app, _) = common::create_test_app();

    let body = r#"{"event":"charge.success","data":{"reference":"fs-sub-1-1"}}"#;
    let signature = sign(b"some_other_secret", body.as_bytes());
    let response = app
        .oneshot(webhook_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_signature_over_different_body() {
    let (app, state) = common::create_test_app();

    let signature = sign(
        &state.config.gateway_webhook_secret,
        br#"{"event":"charge.success","data":{"reference":"original"}}"#,
    );
    let tampered = r#"{"event":"charge.success","data":{"reference":"tampered"}}"#;
    let response = app
        .oneshot(webhook_request(Some(&signature), tampered))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_ignores_unrelated_event() {
    let (app, state) = common::create_test_app();

    // Correctly signed events we don't handle are acknowledged without
    // touching the database.
    let body = r#"{"event":"transfer.success","data":{"reference":"tr-1"}}"#;
    let signature = sign(&state.config.gateway_webhook_secret, body.as_bytes());
    let response = app
        .oneshot(webhook_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_rejects_malformed_body() {
    let (app, state) = common::create_test_app();

    let body = "not json";
    let signature = sign(&state.config.gateway_webhook_secret, body.as_bytes());
    let response = app
        .oneshot(webhook_request(Some(&signature), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

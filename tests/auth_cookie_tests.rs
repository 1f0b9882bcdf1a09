// SPDX-License-Identifier: MIT

//! Session cookie behaviour.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use fitsavory::config::SESSION_COOKIE;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .expect("logout should set a removal cookie");
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
}

#[tokio::test]
async fn test_cookie_takes_precedence_over_header() {
    let (app, state) = common::create_test_app();
    let good = common::user_token(&state, 42);

    // Valid cookie with a garbage Authorization header: the cookie wins,
    // so the request authenticates.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, good))
                .header(header::AUTHORIZATION, "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let (app, state) = common::create_test_app();

    let claims = serde_json::json!({
        "sub": "42",
        "role": "user",
        "iat": 1_000_000,
        "exp": 1_000_100,
    });
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&state.config.jwt_signing_key),
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/me")
                .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// SPDX-License-Identifier: MIT

//! Cursor parameter handling on the recipe listing.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tower::ServiceExt;

mod common;

async fn list_with_cursor(cursor: &str) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = common::user_token(&state, 42);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/recipes?cursor={}", cursor))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_rejects_non_base64_cursor() {
    assert_eq!(
        list_with_cursor("not!!valid!!base64").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_rejects_cursor_with_wrong_shape() {
    // Decodes fine but has two fields instead of three
    let cursor = URL_SAFE_NO_PAD.encode("12345:0");
    assert_eq!(list_with_cursor(&cursor).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejects_cursor_with_non_numeric_id() {
    let cursor = URL_SAFE_NO_PAD.encode("12345:0:abc");
    assert_eq!(list_with_cursor(&cursor).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_well_formed_cursor_reaches_database() {
    // Valid cursor passes parsing; the offline database then fails with 500
    let cursor = URL_SAFE_NO_PAD.encode("1756500000:0:17");
    assert_eq!(
        list_with_cursor(&cursor).await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

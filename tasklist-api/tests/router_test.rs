//! Integration tests for routing, the response envelope, and the
//! bearer-token gate: everything that answers before the database is
//! consulted.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use common::{json_request, response_json, test_app, TEST_JWT_SECRET};
use serde_json::json;
use tasklist_shared::auth::jwt::{create_token, Claims};
use tower::ServiceExt as _;
use uuid::Uuid;

#[tokio::test]
async fn test_welcome_document() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["todos"], "/api/todos");
}

#[tokio::test]
async fn test_unknown_route_gets_404_envelope() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/api/todos").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_protected_route_with_non_bearer_header() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/user/profile")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Expected Bearer token");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::get("/api/todos")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let app = test_app();

    let claims = Claims::new(Uuid::new_v4(), Duration::seconds(-60));
    let token = create_token(&claims, TEST_JWT_SECRET).unwrap();

    let response = app
        .oneshot(
            Request::get("/api/todos")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_protected_route_with_foreign_signature() {
    let app = test_app();

    let claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
    let token = create_token(&claims, "some-other-secret-also-32-chars-long!").unwrap();

    let response = app
        .oneshot(
            Request::patch("/api/todos/6f1b2a9e-0000-0000-0000-000000000000/complete")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_with_missing_fields() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({"username": "ada"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_register_with_short_password() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "short",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("at least 6 characters"));
}

#[tokio::test]
async fn test_register_with_invalid_email() {
    let app = test_app();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({
                "username": "ada",
                "email": "not-an-email",
                "password": "secret123",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Invalid email"));
}

#[tokio::test]
async fn test_login_with_malformed_body() {
    let app = test_app();

    let response = app
        .oneshot(json_request("POST", "/api/auth/login", json!({"nope": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = test_app();

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
    // Not production: HSTS stays off.
    assert!(response.headers().get("Strict-Transport-Security").is_none());
}

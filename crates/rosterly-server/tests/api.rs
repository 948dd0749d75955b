//! End-to-end tests for the HTTP API, driven through the router with
//! `tower::ServiceExt::oneshot` and an in-memory record store.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rosterly_server::{app, token, AppState};
use rosterly_store::RecordStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "test-secret";

fn test_app() -> Router {
    let store = RecordStore::in_memory().expect("failed to create in-memory store");
    app(AppState {
        store: Arc::new(store),
        session_secret: token::derive_session_secret(TEST_SECRET),
        session_ttl_secs: 3600,
    })
}

async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(tok) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {tok}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("failed to build request"))
        .await
        .expect("request failed");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    };
    (status, json)
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> (StatusCode, Value) {
    request(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": password })),
    )
    .await
}

/// Registers and logs in a user, returning their session token.
async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = request(
        app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("no token in response").to_string()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = test_app();
    let (status, body) = request(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_full_student_lifecycle() {
    let app = test_app();

    let (status, body) = register(&app, "Alice", "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert!(body["user"].get("password").is_none(), "password leaked");

    // Wrong password: stays anonymous.
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": "alice@x.com", "password": "pw2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "alice@x.com", "pw1").await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "first_name": "A",
            "last_name": "B",
            "email": "a@b.com",
            "student_number": "S1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["student"]["id"], 1);
    assert_eq!(body["student"]["phone"], Value::Null);

    let (status, body) = request(&app, Method::GET, "/api/students", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["students"].as_array().unwrap().len(), 1);
    assert_eq!(body["students"][0]["id"], 1);

    // Duplicate student number, even from another owner, is a 400.
    register(&app, "Bob", "bob@x.com", "pw3").await;
    let bob_token = login(&app, "bob@x.com", "pw3").await;
    let (status, body) = request(
        &app,
        Method::POST,
        "/api/students",
        Some(&bob_token),
        Some(json!({
            "first_name": "C",
            "last_name": "D",
            "email": "c@d.com",
            "student_number": "S1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Student number already exists");

    let (status, body) =
        request(&app, Method::DELETE, "/api/students/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = request(&app, Method::GET, "/api/students/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn register_validates_required_fields() {
    let app = test_app();

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Alice", "email": "alice@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");

    // Empty strings count as missing.
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "", "email": "alice@x.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = test_app();
    let (status, _) = register(&app, "Alice", "alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = register(&app, "Alice Again", "alice@x.com", "pw2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
}

#[tokio::test]
async fn registration_does_not_authenticate() {
    let app = test_app();
    register(&app, "Alice", "alice@x.com", "pw1").await;

    // No token issued at registration; record routes still require login.
    let (status, _) = request(&app, Method::GET, "/api/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let app = test_app();
    let (status, _) = request(
        &app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": "nobody@x.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_routes_require_valid_session() {
    let app = test_app();

    for (method, uri) in [
        (Method::GET, "/api/students"),
        (Method::POST, "/api/students"),
        (Method::GET, "/api/students/1"),
        (Method::PUT, "/api/students/1"),
        (Method::DELETE, "/api/students/1"),
    ] {
        let (status, _) = request(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} without token");

        let (status, _) = request(&app, method, uri, Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} with garbage token");
    }
}

#[tokio::test]
async fn valid_token_for_missing_user_is_not_found() {
    let app = test_app();

    // Signed correctly, but no such user exists in the store.
    let ghost = token::issue_token("ghost@x.com", &token::derive_session_secret(TEST_SECRET), 3600);
    let (status, body) = request(&app, Method::GET, "/api/students", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn records_are_invisible_across_owners() {
    let app = test_app();
    register(&app, "Alice", "alice@x.com", "pw1").await;
    register(&app, "Bob", "bob@x.com", "pw2").await;
    let alice = login(&app, "alice@x.com", "pw1").await;
    let bob = login(&app, "bob@x.com", "pw2").await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/students",
        Some(&alice),
        Some(json!({
            "first_name": "A",
            "last_name": "B",
            "email": "a@b.com",
            "student_number": "S1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["student"]["id"].as_i64().unwrap();

    let (status, body) = request(&app, Method::GET, "/api/students", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["students"].as_array().unwrap().is_empty());

    // Ownership mismatch reports NotFound, never Forbidden.
    let uri = format!("/api/students/{id}");
    let (status, _) = request(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(&app, Method::PUT, &uri, Some(&bob), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Still intact for its owner.
    let (status, _) = request(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_student_validates_required_fields() {
    let app = test_app();
    register(&app, "Alice", "alice@x.com", "pw1").await;
    let token = login(&app, "alice@x.com", "pw1").await;

    let (status, body) = request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({ "first_name": "A", "last_name": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn update_merges_partial_fields_and_clears_on_null() {
    let app = test_app();
    register(&app, "Alice", "alice@x.com", "pw1").await;
    let token = login(&app, "alice@x.com", "pw1").await;

    let (_, body) = request(
        &app,
        Method::POST,
        "/api/students",
        Some(&token),
        Some(json!({
            "first_name": "A",
            "last_name": "B",
            "email": "a@b.com",
            "phone": "555-0100",
            "student_number": "S1"
        })),
    )
    .await;
    let id = body["student"]["id"].as_i64().unwrap();
    let uri = format!("/api/students/{id}");

    // Partial update: change one field, clear phone with an explicit null.
    let (status, body) = request(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "first_name": "Alpha", "phone": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student"]["first_name"], "Alpha");
    assert_eq!(body["student"]["last_name"], "B");
    assert_eq!(body["student"]["phone"], Value::Null);

    // An empty update leaves the record exactly as it was.
    let (status, after) = request(&app, Method::PUT, &uri, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["student"], body["student"]);
}

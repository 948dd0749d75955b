//! Rosterly server library logic.
//!
//! The access-controlled API layer over the record store: for each
//! request the session middleware resolves the caller's identity from a
//! signed bearer token, and every student operation is scoped to that
//! identity's owned records.

pub mod api;
pub mod api_auth;
pub mod api_students;
pub mod config;
pub mod middleware;
pub mod token;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use rosterly_store::RecordStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
pub struct AppState {
    /// The record store backing every user and student operation.
    pub store: Arc<RecordStore>,
    /// Derived HMAC secret for signing session tokens.
    pub session_secret: [u8; 32],
    /// Session token lifetime in seconds.
    pub session_ttl_secs: u64,
}

/// Maximum request body size (64 KiB). The API only ever receives small
/// JSON bodies; anything larger is rejected before deserialization.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/students",
            post(api_students::create_student_handler).get(api_students::list_students_handler),
        )
        .route(
            "/api/students/{id}",
            get(api_students::get_student_handler)
                .put(api_students::update_student_handler)
                .delete(api_students::delete_student_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(api_auth::register_handler))
        .route("/api/auth/session", post(api_auth::login_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

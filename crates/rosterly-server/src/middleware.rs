//! Session authentication middleware.

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use rosterly_store::User;
use std::sync::Arc;

use crate::api::ApiError;
use crate::{token, AppState};

/// The authenticated caller, stored in request extensions by
/// [`auth_middleware`] and consumed by the student handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware authenticating requests via `Authorization: Bearer <token>`.
///
/// Verifies the token's signature and expiry, then re-resolves the token's
/// email against the record store on every request. A cached identity is
/// never trusted: a valid token whose email no longer resolves to a user
/// yields 404, so a stale session surfaces as a missing user rather than
/// a live one.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?
        .to_string();

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::Internal("app state missing".to_string()))?
        .clone();

    let email = token::verify_token(&token, &state.session_secret)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let user = state
        .store
        .find_user_by_email(&email)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

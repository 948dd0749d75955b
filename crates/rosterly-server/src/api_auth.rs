//! Registration and login handlers.
//!
//! Registration creates an account but does not establish a session; the
//! caller must exchange credentials at the session endpoint afterwards.
//! Login succeeds iff the submitted password verifies against the stored
//! bcrypt hash; plaintext passwords never touch the store.

use axum::{extract::Extension, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::ApiError;
use crate::{token, AppState};

/// Request body for `POST /api/auth/register`.
///
/// Fields are optional so that an absent field reports the contract's
/// 400 "Missing required fields" instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for `POST /api/auth/session`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user as exposed over the API: never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// Handler for `POST /api/auth/register`.
///
/// Anonymous-only. Does not auto-authenticate the new user.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (name, email, password) = match (payload.name, payload.email, payload.password) {
        (Some(n), Some(e), Some(p)) if !n.is_empty() && !e.is_empty() && !p.is_empty() => {
            (n, e, p)
        }
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };

    // bcrypt hashing is deliberately slow; keep it off the async runtime.
    let user = tokio::task::spawn_blocking(move || {
        let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::Internal(format!("password hash failed: {}", e)))?;
        state
            .store
            .create_user(&name, &email, &hash)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    tracing::info!(user_id = user.id, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user: UserView {
                id: user.id,
                email: user.email,
                name: user.name,
            },
        }),
    ))
}

/// Handler for `POST /api/auth/session` (credential exchange).
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = match (payload.email, payload.password) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(ApiError::BadRequest("Missing required fields".to_string())),
    };

    let verify_state = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let user = verify_state
            .store
            .find_user_by_email(&email)
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

        let ok = bcrypt::verify(&password, &user.password)
            .map_err(|e| ApiError::Internal(format!("password verify failed: {}", e)))?;
        if !ok {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(user)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    let session_token =
        token::issue_token(&user.email, &state.session_secret, state.session_ttl_secs);

    tracing::debug!(user_id = user.id, "session established");

    Ok(Json(LoginResponse {
        token: session_token,
        user: UserView {
            id: user.id,
            email: user.email,
            name: user.name,
        },
    }))
}

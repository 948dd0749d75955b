//! Student CRUD handlers.
//!
//! Every handler runs behind [`crate::middleware::auth_middleware`] and
//! scopes store operations to the authenticated caller's id. A record id
//! that belongs to another owner is reported as 404, identical to an id
//! that does not exist at all: the API never reveals whether another
//! user's record exists.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use rosterly_store::{NewStudent, Student, StudentUpdate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;

/// Request body for `POST /api/students`.
///
/// Required fields are optional at the type level so that missing ones
/// produce the contract's 400 instead of a deserialization failure.
/// Empty strings count as missing.
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub student_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub students: Vec<Student>,
}

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub student: Student,
}

/// Handler for `GET /api/students`.
pub async fn list_students_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<StudentListResponse>, ApiError> {
    let students = state.store.list_students(user.id);
    Ok(Json(StudentListResponse { students }))
}

/// Handler for `POST /api/students`.
pub async fn create_student_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    let required = [
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.student_number,
    ];
    if required.iter().any(|f| f.as_deref().is_none_or(str::is_empty)) {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }

    let fields = NewStudent {
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        email: payload.email.unwrap_or_default(),
        // Empty optional strings are normalized to null.
        phone: payload.phone.filter(|v| !v.is_empty()),
        date_of_birth: payload.date_of_birth.filter(|v| !v.is_empty()),
        student_number: payload.student_number.unwrap_or_default(),
        address: payload.address.filter(|v| !v.is_empty()),
    };

    let student = tokio::task::spawn_blocking(move || {
        state
            .store
            .create_student(user.id, fields)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    tracing::info!(student_id = student.id, owner_id = student.user_id, "created student");

    Ok((StatusCode::CREATED, Json(StudentResponse { student })))
}

/// Handler for `GET /api/students/{id}`.
pub async fn get_student_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = state
        .store
        .get_student(user.id, id)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    Ok(Json(StudentResponse { student }))
}

/// Handler for `PUT /api/students/{id}`.
///
/// Accepts a partial field set; absent fields keep their stored value,
/// while `phone` and `address` accept an explicit `null` as a clear.
pub async fn update_student_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = tokio::task::spawn_blocking(move || {
        state
            .store
            .update_student(user.id, id, update)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??
    .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse { student }))
}

/// Handler for `DELETE /api/students/{id}`.
pub async fn delete_student_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let removed = tokio::task::spawn_blocking(move || {
        state.store.delete_student(user.id, id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    if !removed {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

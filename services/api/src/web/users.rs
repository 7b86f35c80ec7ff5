//! services/api/src/web/users.rs
//!
//! Student account endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use course_admin_core::domain::{NewUser, User};
use course_admin_core::users::CreatedUser;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::web::rest::{respond, Envelope, Reply};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

/// Replacement set of course entitlements.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCoursesRequest {
    pub course_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    /// Must match the email of the account.
    pub email: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "Data is `User[]`", body = Envelope))
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> Reply<Vec<User>> {
    respond(state.users.list_users().await, StatusCode::OK)
}

/// Create a student account with its first course entitlements and send the
/// welcome email.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "Data is `CreatedUser`", body = Envelope),
        (status = 400, description = "Invalid payload", body = Envelope),
        (status = 409, description = "Email is already in use", body = Envelope)
    )
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> Reply<CreatedUser> {
    respond(state.users.create_user(new_user).await, StatusCode::CREATED)
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/courses",
    params(("id" = String, Path, description = "User id")),
    request_body = UserCoursesRequest,
    responses(
        (status = 200, description = "Entitlements replaced", body = Envelope),
        (status = 404, description = "User not found", body = Envelope)
    )
)]
pub async fn update_user_courses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UserCoursesRequest>,
) -> Reply<()> {
    respond(
        state.users.update_user_courses(&id, req.course_ids).await,
        StatusCode::OK,
    )
}

/// Delete the user document and the identity account behind it.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = Envelope),
        (status = 404, description = "User not found", body = Envelope)
    )
)]
pub async fn delete_user(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Reply<()> {
    respond(state.users.delete_user(&id).await, StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/password-reset",
    params(("id" = String, Path, description = "User id")),
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent", body = Envelope),
        (status = 400, description = "Email missing or not the user's", body = Envelope),
        (status = 404, description = "User not found", body = Envelope)
    )
)]
pub async fn send_password_reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PasswordResetRequest>,
) -> Reply<()> {
    respond(
        state.users.send_password_reset(&id, &req.email).await,
        StatusCode::OK,
    )
}

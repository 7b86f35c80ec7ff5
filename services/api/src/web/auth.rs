//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for admin login, logout, and password resets.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use course_admin_core::domain::AccountRole;
use course_admin_core::{FailureKind, OperationResult, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::web::middleware::session_cookie;
use crate::web::rest::{respond, Envelope, Reply};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePasswordResetRequest {
    /// Token from the emailed reset link.
    pub token: String,
    pub new_password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/login - Login with an admin account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Not an admin account"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Verify the password
    let account = state
        .identity
        .verify_credentials(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
            }
            other => {
                error!("Failed to verify credentials: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
            }
        })?;

    // 2. Only admins may use this service
    if account.role != AccountRole::Admin {
        warn!(account_id = %account.id, "Non-admin login refused");
        return Err((StatusCode::FORBIDDEN, "Admin access required".to_string()));
    }

    // 3. Create the auth session
    let ttl = Duration::days(state.config.session_ttl_days);
    let auth_session_id = state
        .identity
        .create_session(&account.id, Utc::now() + ttl)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    // 4. Create session cookie
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );
    info!(account_id = %account.id, "Admin signed in");

    // 5. Return response with cookie
    let response = AuthResponse {
        user_id: account.id,
        email: account.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /api/auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_cookie(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Delete auth session
    state
        .identity
        .delete_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    // 3. Clear cookie
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}

/// POST /api/auth/password-reset - Pick a new password with an emailed token
#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    request_body = CompletePasswordResetRequest,
    responses(
        (status = 200, description = "Password updated", body = Envelope),
        (status = 400, description = "Password too short", body = Envelope),
        (status = 401, description = "Reset link is invalid or has expired", body = Envelope)
    )
)]
pub async fn complete_password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompletePasswordResetRequest>,
) -> Reply<()> {
    let result = match state
        .identity
        .complete_password_reset(&req.token, &req.new_password)
        .await
    {
        Ok(()) => OperationResult::done("Password updated"),
        Err(PortError::Unauthorized) => OperationResult::failure(
            FailureKind::Unauthorized,
            "Reset link is invalid or has expired",
        ),
        Err(e) => {
            error!("Failed to reset password: {:?}", e);
            OperationResult::from_error("Failed to reset password", &e)
        }
    };
    respond(result, StatusCode::OK)
}

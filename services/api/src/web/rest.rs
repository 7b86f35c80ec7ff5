//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the health endpoint,
//! and the mapping from `OperationResult` to HTTP responses shared by every
//! REST handler.

use axum::{http::StatusCode, response::Json};
use course_admin_core::courses::CreatedCourse;
use course_admin_core::domain::{
    AssignmentSummary, AssignmentSync, CategoryDraft, Course, CourseDraft, CourseOption,
    CourseStatus, CourseTree, DraftId, Module, ModuleDraft, ModuleTree, NewUser, Project,
    ProjectCategory, ProjectDraft, ResubmissionDraft, ReviewDraft, Section, SectionDraft,
    Submission, SubmissionStatus, User, UserProject, Video,
};
use course_admin_core::reconciler::ReconcileSummary;
use course_admin_core::users::CreatedUser;
use course_admin_core::{FailureKind, OperationResult};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, courses, projects, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::complete_password_reset_handler,
        courses::list_courses,
        courses::create_course,
        courses::course_options,
        courses::get_course,
        courses::update_course,
        courses::delete_course,
        courses::upload_thumbnail,
        users::list_users,
        users::create_user,
        users::update_user_courses,
        users::delete_user,
        users::send_password_reset,
        projects::list_categories,
        projects::create_category,
        projects::get_category,
        projects::update_category,
        projects::delete_category,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::update_project,
        projects::delete_project,
        projects::list_assignments,
        projects::sync_assignments,
        projects::list_submissions,
        projects::review_submission,
        projects::resubmit,
    ),
    components(
        schemas(
            Envelope, FailureKind, HealthResponse,
            CourseDraft, ModuleDraft, SectionDraft, DraftId, Video, CourseStatus,
            CourseTree, ModuleTree, Course, Module, Section, CourseOption,
            CreatedCourse, ReconcileSummary,
            User, NewUser, CreatedUser,
            ProjectCategory, CategoryDraft, Project, ProjectDraft, UserProject,
            AssignmentSync, AssignmentSummary, Submission, SubmissionStatus,
            ReviewDraft, ResubmissionDraft,
            auth::LoginRequest, auth::AuthResponse, auth::CompletePasswordResetRequest,
            users::UserCoursesRequest, users::PasswordResetRequest,
        )
    ),
    tags(
        (name = "Course Admin API", description = "Admin endpoints for courses, users and projects.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Response Mapping
//=========================================================================================

/// Documents the `{ success, message, data?, error? }` body every admin
/// endpoint answers with. `data` depends on the operation.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct Envelope {
    success: bool,
    message: String,
    #[schema(value_type = Object)]
    data: Option<serde_json::Value>,
    error: Option<FailureKind>,
}

/// What every admin handler returns.
pub type Reply<T> = (StatusCode, Json<OperationResult<T>>);

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Sends `result` with `success` on success, or the status of its failure kind.
pub fn respond<T: Serialize>(result: OperationResult<T>, success: StatusCode) -> Reply<T> {
    let status = result.kind().map(status_for).unwrap_or(success);
    (status, Json(result))
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

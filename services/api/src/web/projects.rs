//! services/api/src/web/projects.rs
//!
//! Project categories, projects, assignments and submission reviews.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use course_admin_core::domain::{
    AssignmentSummary, AssignmentSync, CategoryDraft, Project, ProjectCategory, ProjectDraft,
    ResubmissionDraft, ReviewDraft, Submission, UserProject,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::web::rest::{respond, Envelope, Reply};
use crate::web::state::AppState;

/// Narrows a listing to one project.
#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ProjectFilter {
    pub project_id: Option<String>,
}

//=========================================================================================
// Categories
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/project-categories",
    responses((status = 200, description = "Data is `ProjectCategory[]`, by title", body = Envelope))
)]
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Reply<Vec<ProjectCategory>> {
    respond(state.projects.list_categories().await, StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/project-categories",
    request_body = CategoryDraft,
    responses(
        (status = 201, description = "Data is `ProjectCategory`", body = Envelope),
        (status = 400, description = "Invalid payload", body = Envelope)
    )
)]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CategoryDraft>,
) -> Reply<ProjectCategory> {
    respond(state.projects.create_category(draft).await, StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api/project-categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Data is `ProjectCategory`", body = Envelope),
        (status = 404, description = "Category not found", body = Envelope)
    )
)]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<ProjectCategory> {
    respond(state.projects.get_category(&id).await, StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/api/project-categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = CategoryDraft,
    responses(
        (status = 200, description = "Data is `ProjectCategory`", body = Envelope),
        (status = 404, description = "Category not found", body = Envelope)
    )
)]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<CategoryDraft>,
) -> Reply<ProjectCategory> {
    respond(state.projects.update_category(&id, draft).await, StatusCode::OK)
}

/// Refused while any project still belongs to the category.
#[utoipa::path(
    delete,
    path = "/api/project-categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = Envelope),
        (status = 404, description = "Category not found", body = Envelope),
        (status = 409, description = "Category is still used by projects", body = Envelope)
    )
)]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<()> {
    respond(state.projects.delete_category(&id).await, StatusCode::OK)
}

//=========================================================================================
// Projects
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "Data is `Project[]` with category titles", body = Envelope))
)]
pub async fn list_projects(State(state): State<Arc<AppState>>) -> Reply<Vec<Project>> {
    respond(state.projects.list_projects().await, StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = ProjectDraft,
    responses(
        (status = 201, description = "Data is `Project`", body = Envelope),
        (status = 400, description = "Invalid payload", body = Envelope),
        (status = 404, description = "Category not found", body = Envelope)
    )
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<ProjectDraft>,
) -> Reply<Project> {
    respond(state.projects.create_project(draft).await, StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Data is `Project`", body = Envelope),
        (status = 404, description = "Project not found", body = Envelope)
    )
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<Project> {
    respond(state.projects.get_project(&id).await, StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    request_body = ProjectDraft,
    responses(
        (status = 200, description = "Data is `Project`", body = Envelope),
        (status = 400, description = "Invalid payload", body = Envelope),
        (status = 404, description = "Project or category not found", body = Envelope)
    )
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<ProjectDraft>,
) -> Reply<Project> {
    respond(state.projects.update_project(&id, draft).await, StatusCode::OK)
}

/// Delete a project together with its assignments.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = Envelope),
        (status = 404, description = "Project not found", body = Envelope)
    )
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<()> {
    respond(state.projects.delete_project(&id).await, StatusCode::OK)
}

//=========================================================================================
// Assignments
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/assignments",
    params(ProjectFilter),
    responses((status = 200, description = "Data is `UserProject[]`", body = Envelope))
)]
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProjectFilter>,
) -> Reply<Vec<UserProject>> {
    respond(
        state.projects.list_assignments(filter.project_id.as_deref()).await,
        StatusCode::OK,
    )
}

/// Make each listed project assigned to exactly the listed users.
#[utoipa::path(
    post,
    path = "/api/assignments/sync",
    request_body = AssignmentSync,
    responses(
        (status = 200, description = "Data is `AssignmentSummary`", body = Envelope),
        (status = 400, description = "No project selected", body = Envelope)
    )
)]
pub async fn sync_assignments(
    State(state): State<Arc<AppState>>,
    Json(sync): Json<AssignmentSync>,
) -> Reply<AssignmentSummary> {
    respond(state.projects.sync_assignments(sync).await, StatusCode::OK)
}

//=========================================================================================
// Submissions
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/submissions",
    params(ProjectFilter),
    responses((status = 200, description = "Data is `Submission[]`, newest first", body = Envelope))
)]
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ProjectFilter>,
) -> Reply<Vec<Submission>> {
    respond(
        state.projects.list_submissions(filter.project_id.as_deref()).await,
        StatusCode::OK,
    )
}

/// Grade a submission, or return it to the student for another attempt.
#[utoipa::path(
    post,
    path = "/api/submissions/{id}/review",
    params(("id" = String, Path, description = "Submission id")),
    request_body = ReviewDraft,
    responses(
        (status = 200, description = "Data is the updated `Submission`", body = Envelope),
        (status = 404, description = "Submission not found", body = Envelope),
        (status = 409, description = "Submission is waiting on the student", body = Envelope)
    )
)]
pub async fn review_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(review): Json<ReviewDraft>,
) -> Reply<Submission> {
    respond(state.projects.review_submission(&id, review).await, StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/submissions/{id}/resubmit",
    params(("id" = String, Path, description = "Submission id")),
    request_body = ResubmissionDraft,
    responses(
        (status = 200, description = "Data is the updated `Submission`", body = Envelope),
        (status = 409, description = "Submission was not returned for resubmission", body = Envelope)
    )
)]
pub async fn resubmit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(links): Json<ResubmissionDraft>,
) -> Reply<Submission> {
    respond(state.projects.resubmit(&id, links).await, StatusCode::OK)
}

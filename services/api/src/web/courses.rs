//! services/api/src/web/courses.rs
//!
//! Course endpoints. Tree writes go through the reconciler in the core crate;
//! these handlers only translate HTTP to service calls and back.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use course_admin_core::courses::CreatedCourse;
use course_admin_core::domain::{CourseDraft, CourseOption, CourseTree};
use course_admin_core::reconciler::ReconcileSummary;
use course_admin_core::{FailureKind, OperationResult};
use tracing::warn;

use crate::web::rest::{respond, Envelope, Reply};
use crate::web::state::AppState;

/// List every course with its modules and sections.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "Data is `CourseTree[]`", body = Envelope),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_courses(State(state): State<Arc<AppState>>) -> Reply<Vec<CourseTree>> {
    respond(state.courses.list_courses().await, StatusCode::OK)
}

/// Create a course from a full desired-state tree.
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CourseDraft,
    responses(
        (status = 201, description = "Data is `CreatedCourse`", body = Envelope),
        (status = 400, description = "Invalid draft", body = Envelope),
        (status = 500, description = "Store failure; every write was rolled back", body = Envelope)
    )
)]
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<CourseDraft>,
) -> Reply<CreatedCourse> {
    respond(state.courses.create_course(draft).await, StatusCode::CREATED)
}

/// Id and title of every course, for entitlement pickers.
#[utoipa::path(
    get,
    path = "/api/courses/options",
    responses((status = 200, description = "Data is `CourseOption[]`", body = Envelope))
)]
pub async fn course_options(State(state): State<Arc<AppState>>) -> Reply<Vec<CourseOption>> {
    respond(state.courses.course_options().await, StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Data is `CourseTree`", body = Envelope),
        (status = 404, description = "Course not found", body = Envelope)
    )
)]
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<CourseTree> {
    respond(state.courses.get_course(&id).await, StatusCode::OK)
}

/// Reconcile the stored tree with the submitted one.
///
/// Modules and sections missing from the draft are deleted; ids the store
/// does not know are recreated. A failed write rolls the whole update back.
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = CourseDraft,
    responses(
        (status = 200, description = "Data is `ReconcileSummary`", body = Envelope),
        (status = 400, description = "Invalid draft", body = Envelope),
        (status = 404, description = "Course not found", body = Envelope),
        (status = 500, description = "Store failure; changes rolled back", body = Envelope)
    )
)]
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(draft): Json<CourseDraft>,
) -> Reply<ReconcileSummary> {
    respond(state.courses.update_course(&id, draft).await, StatusCode::OK)
}

/// Delete a course, its whole tree, and every user's entitlement to it.
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Data is `ReconcileSummary`", body = Envelope),
        (status = 404, description = "Course not found", body = Envelope)
    )
)]
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<ReconcileSummary> {
    respond(state.courses.delete_course(&id).await, StatusCode::OK)
}

/// Upload a course thumbnail.
///
/// Accepts a multipart/form-data request whose `file` part holds a PNG, JPEG,
/// WebP or GIF image.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/thumbnail",
    params(("id" = String, Path, description = "Course id")),
    request_body(content_type = "multipart/form-data", description = "The image, in a part named `file`."),
    responses(
        (status = 200, description = "Data is the public URL of the stored image", body = Envelope),
        (status = 400, description = "Missing file or unsupported image type", body = Envelope),
        (status = 404, description = "Course not found", body = Envelope)
    )
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Reply<String> {
    let mut upload: Option<(Bytes, String)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((bytes, content_type)),
                    Err(e) => {
                        warn!("Failed to read thumbnail upload: {}", e);
                        return bad_upload(format!("Failed to read file bytes: {e}"));
                    }
                }
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => return bad_upload(format!("Failed to read multipart data: {e}")),
        }
    }

    let Some((bytes, content_type)) = upload else {
        return bad_upload("Multipart form must include a file".to_string());
    };
    respond(
        state.courses.set_thumbnail(&id, &bytes, &content_type).await,
        StatusCode::OK,
    )
}

fn bad_upload(message: String) -> Reply<String> {
    respond(
        OperationResult::failure(FailureKind::Validation, message),
        StatusCode::OK,
    )
}

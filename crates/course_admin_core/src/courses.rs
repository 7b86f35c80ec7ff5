//! crates/course_admin_core/src/courses.rs
//!
//! Course operations exposed to the HTTP layer. Writes to the tree go through
//! the reconciler under the per-course lock; reads assemble ordered trees.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use crate::domain::{CourseDraft, CourseOption, CourseTree, ModuleTree};
use crate::locks::CourseLocks;
use crate::ports::{BlobStorage, DocumentStore, PortError, PortResult};
use crate::reconciler::{CourseReconciler, ReconcileError, ReconcileSummary};
use crate::records::{CourseRecord, ModuleRecord, SectionRecord, UserCoursesPatch, UserRecord};
use crate::result::{FailureKind, OperationResult};
use crate::store::{self, to_fields, StoredDocument};

/// Payload of a successful `create_course`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreatedCourse {
    pub course_id: String,
    pub summary: ReconcileSummary,
}

/// Thumbnail formats accepted for upload.
pub const THUMBNAIL_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

pub struct CourseService {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    reconciler: CourseReconciler,
    locks: CourseLocks,
}

impl CourseService {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self {
            reconciler: CourseReconciler::new(store.clone()),
            store,
            blobs,
            locks: CourseLocks::new(),
        }
    }

    pub async fn create_course(&self, draft: CourseDraft) -> OperationResult<CreatedCourse> {
        if let Err(e) = draft.validate() {
            return OperationResult::rejected(&e.into());
        }
        match self.reconciler.create(&draft).await {
            Ok((course_id, summary)) => OperationResult::ok(
                "Course created successfully",
                CreatedCourse { course_id, summary },
            ),
            Err(e) => failure_of("Failed to create course", e),
        }
    }

    pub async fn update_course(
        &self,
        course_id: &str,
        draft: CourseDraft,
    ) -> OperationResult<ReconcileSummary> {
        if let Err(e) = draft.validate() {
            return OperationResult::rejected(&e.into());
        }
        let _guard = self.locks.acquire(course_id).await;
        match self.reconciler.update(course_id, &draft).await {
            Ok(summary) => OperationResult::ok("Course updated successfully", summary),
            Err(e) => failure_of("Failed to update course", e),
        }
    }

    /// Deletes the course tree, then drops the course from every user's
    /// entitlements.
    pub async fn delete_course(&self, course_id: &str) -> OperationResult<ReconcileSummary> {
        let _guard = self.locks.acquire(course_id).await;
        let summary = match self.reconciler.delete(course_id).await {
            Ok(summary) => summary,
            Err(e) => return failure_of("Failed to delete course", e),
        };
        if let Err(e) = self.revoke_entitlements(course_id).await {
            warn!(course_id, error = %e, "Course deleted but some users still reference it");
        }
        OperationResult::ok("Course deleted successfully", summary)
    }

    pub async fn list_courses(&self) -> OperationResult<Vec<CourseTree>> {
        let result = async {
            let courses = self.store.list(&store::courses(), None).await?;
            try_join_all(courses.iter().map(|doc| self.assemble(doc))).await
        }
        .await;
        match result {
            Ok(trees) => OperationResult::ok("Courses loaded", trees),
            Err(e) => {
                error!(error = %e, "Failed to fetch courses");
                OperationResult::from_error("Failed to fetch courses", &e)
            }
        }
    }

    pub async fn get_course(&self, course_id: &str) -> OperationResult<CourseTree> {
        let result = async {
            let doc = self
                .store
                .get(&store::course(course_id))
                .await?
                .ok_or_else(|| PortError::NotFound("Course not found".to_string()))?;
            self.assemble(&doc).await
        }
        .await;
        match result {
            Ok(tree) => OperationResult::ok("Course loaded", tree),
            Err(e) => OperationResult::from_error("Failed to fetch course", &e),
        }
    }

    pub async fn course_options(&self) -> OperationResult<Vec<CourseOption>> {
        let result = async {
            let docs = self.store.list(&store::courses(), None).await?;
            docs.into_iter()
                .map(|doc| {
                    let record: CourseRecord = doc.decode()?;
                    Ok::<_, PortError>(CourseOption {
                        id: doc.id,
                        main_title: record.main_title,
                    })
                })
                .collect::<PortResult<Vec<_>>>()
        }
        .await;
        match result {
            Ok(options) => OperationResult::ok("Courses loaded", options),
            Err(e) => {
                error!(error = %e, "Failed to fetch course options");
                OperationResult::from_error("Failed to fetch courses", &e)
            }
        }
    }

    /// Stores an uploaded image and points the course thumbnail at it.
    pub async fn set_thumbnail(
        &self,
        course_id: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> OperationResult<String> {
        if !THUMBNAIL_TYPES.contains(&content_type) {
            return OperationResult::failure(
                FailureKind::Validation,
                format!("Unsupported thumbnail type: {content_type}"),
            );
        }
        if bytes.is_empty() {
            return OperationResult::failure(FailureKind::Validation, "Thumbnail file is empty");
        }
        let _guard = self.locks.acquire(course_id).await;
        let result = async {
            let path = store::course(course_id);
            if self.store.get(&path).await?.is_none() {
                return Err(PortError::NotFound("Course not found".to_string()));
            }
            let url = self.blobs.save(bytes, content_type).await?;
            let mut fields = store::Fields::new();
            fields.insert("thumbnail".into(), serde_json::Value::String(url.clone()));
            fields.insert(
                "updatedAt".into(),
                serde_json::to_value(chrono::Utc::now())?,
            );
            self.store.update(&path, fields).await?;
            Ok::<_, PortError>(url)
        }
        .await;
        match result {
            Ok(url) => {
                info!(course_id, url = %url, "Course thumbnail updated");
                OperationResult::ok("Thumbnail uploaded", url)
            }
            Err(e) => {
                error!(course_id, error = %e, "Failed to upload thumbnail");
                OperationResult::from_error("Failed to upload thumbnail", &e)
            }
        }
    }

    async fn assemble(&self, doc: &StoredDocument) -> PortResult<CourseTree> {
        let course = doc.decode::<CourseRecord>()?.to_domain(&doc.id);
        let module_docs = self
            .store
            .list(&store::modules(&doc.id), Some("order"))
            .await?;
        let modules = try_join_all(module_docs.iter().map(|module_doc| async move {
            let module = module_doc.decode::<ModuleRecord>()?.to_domain(&module_doc.id);
            let sections = self
                .store
                .list(&store::sections(&doc.id, &module_doc.id), Some("order"))
                .await?
                .iter()
                .map(|s| Ok::<_, PortError>(s.decode::<SectionRecord>()?.to_domain(&s.id)))
                .collect::<PortResult<Vec<_>>>()?;
            Ok::<_, PortError>(ModuleTree { module, sections })
        }))
        .await?;
        Ok(CourseTree { course, modules })
    }

    async fn revoke_entitlements(&self, course_id: &str) -> PortResult<()> {
        let users = self.store.list(&store::users(), None).await?;
        let updates = users.into_iter().filter_map(|doc| {
            let record: UserRecord = doc.decode().ok()?;
            if !record.course_ids.iter().any(|id| id == course_id) {
                return None;
            }
            let patch = UserCoursesPatch {
                course_ids: record
                    .course_ids
                    .into_iter()
                    .filter(|id| id != course_id)
                    .collect(),
                updated_at: chrono::Utc::now(),
            };
            Some(async move {
                self.store
                    .update(&store::users().doc(doc.id), to_fields(&patch)?)
                    .await
            })
        });
        try_join_all(updates).await?;
        Ok(())
    }
}

fn failure_of<T>(context: &str, error: ReconcileError) -> OperationResult<T> {
    match error {
        ReconcileError::CourseNotFound => {
            OperationResult::failure(FailureKind::NotFound, "Course not found")
        }
        ReconcileError::Aborted { error, undo_failures } => {
            let detail = match &error {
                PortError::NotFound(m)
                | PortError::Validation(m)
                | PortError::Conflict(m)
                | PortError::Unexpected(m) => m.clone(),
                PortError::Unauthorized => error.to_string(),
            };
            let rollback = if undo_failures == 0 {
                "changes rolled back".to_string()
            } else {
                format!("{undo_failures} changes could not be rolled back")
            };
            OperationResult::failure((&error).into(), format!("{context}: {detail} ({rollback})"))
        }
    }
}

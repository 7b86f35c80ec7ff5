//! crates/course_admin_core/src/reconciler/mod.rs
//!
//! The course tree reconciler: merges a desired-state course (modules →
//! sections → videos) into the persisted tree.
//!
//! A pass runs `load → merge modules → prune orphans`. Modules merge
//! concurrently and each module merges its sections concurrently; every
//! phase is joined before the next starts, so pruning never sees a
//! half-merged tree. Every write is journaled, and any failure rolls the
//! whole pass back before the error is returned.

mod journal;
mod loader;
mod merge;
mod plan;
mod prune;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info};

use crate::domain::CourseDraft;
use crate::ports::{DocumentStore, PortError};
use crate::records::{CoursePatch, CourseRecord};
use crate::store::{self, to_fields};

pub use journal::{ReconcileSummary, WriteJournal};
pub use loader::Siblings;
pub use plan::{resolve, Resolution};

use journal::Tally;
use merge::{settle, MergeContext};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Course not found")]
    CourseNotFound,
    /// A write failed. Everything already written was reverted, except for
    /// `undo_failures` steps that could not be applied.
    #[error("{error}")]
    Aborted { error: PortError, undo_failures: usize },
}

impl ReconcileError {
    pub fn rolled_back_cleanly(&self) -> bool {
        matches!(self, ReconcileError::Aborted { undo_failures: 0, .. })
    }
}

/// Applies course drafts to a document store.
#[derive(Clone)]
pub struct CourseReconciler {
    store: Arc<dyn DocumentStore>,
}

impl CourseReconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Brings the persisted course to the state described by `draft`.
    ///
    /// A missing course fails before any write is issued.
    pub async fn update(
        &self,
        course_id: &str,
        draft: &CourseDraft,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let store = self.store.as_ref();
        let course_doc = loader::load_course(store, course_id)
            .await
            .map_err(|error| ReconcileError::Aborted { error, undo_failures: 0 })?
            .ok_or(ReconcileError::CourseNotFound)?;
        let current: CourseRecord = course_doc
            .decode()
            .map_err(|error| ReconcileError::Aborted { error, undo_failures: 0 })?;

        let journal = WriteJournal::new();
        let tally = Tally::default();
        let ctx = MergeContext {
            store,
            journal: &journal,
            tally: &tally,
            course_id,
            now: Utc::now(),
        };

        let pass = async {
            let patch = CoursePatch {
                main_title: draft.main_title.clone(),
                description: draft.description.clone(),
                status: draft.status.unwrap_or(current.status),
                thumbnail: draft.thumbnail.clone(),
                updated_at: ctx.now,
            };
            let path = store::course(course_id);
            store.update(&path, to_fields(&patch)?).await?;
            journal.overwritten(path, course_doc.fields.clone());

            debug!(course_id, "Loading existing modules");
            let existing = loader::load_modules(store, course_id).await?;
            let keep = merge::merge_modules(ctx, &draft.modules, &existing).await?;
            prune::prune_modules(ctx, &existing, &keep).await?;
            Ok::<(), PortError>(())
        };

        match pass.await {
            Ok(()) => {
                let summary = tally.summary();
                info!(course_id, ?summary, "Course reconciled");
                Ok(summary)
            }
            Err(error) => Err(self.abort(course_id, &journal, error).await),
        }
    }

    /// Creates a course and its whole tree. Returns the new course id.
    pub async fn create(
        &self,
        draft: &CourseDraft,
    ) -> Result<(String, ReconcileSummary), ReconcileError> {
        let store = self.store.as_ref();
        let now = Utc::now();
        let record = CourseRecord {
            main_title: draft.main_title.clone(),
            description: draft.description.clone(),
            status: draft.status.unwrap_or(crate::domain::CourseStatus::Active),
            thumbnail: draft.thumbnail.clone(),
            created_at: now,
            updated_at: now,
        };
        let fields = to_fields(&record)
            .map_err(|error| ReconcileError::Aborted { error, undo_failures: 0 })?;
        let course_id = store
            .create(&store::courses(), fields)
            .await
            .map_err(|error| ReconcileError::Aborted { error, undo_failures: 0 })?;

        let journal = WriteJournal::new();
        journal.created(store::course(&course_id));
        let tally = Tally::default();
        let ctx = MergeContext {
            store,
            journal: &journal,
            tally: &tally,
            course_id: &course_id,
            now,
        };

        match merge::merge_modules(ctx, &draft.modules, &Siblings::default()).await {
            Ok(_) => {
                let summary = tally.summary();
                info!(course_id = %course_id, ?summary, "Course created");
                Ok((course_id, summary))
            }
            Err(error) => Err(self.abort(&course_id, &journal, error).await),
        }
    }

    /// Deletes every section, then every module, then the course itself.
    pub async fn delete(&self, course_id: &str) -> Result<ReconcileSummary, ReconcileError> {
        let store = self.store.as_ref();
        let course_doc = loader::load_course(store, course_id)
            .await
            .map_err(|error| ReconcileError::Aborted { error, undo_failures: 0 })?
            .ok_or(ReconcileError::CourseNotFound)?;

        let journal = WriteJournal::new();
        let tally = Tally::default();
        let ctx = MergeContext {
            store,
            journal: &journal,
            tally: &tally,
            course_id,
            now: Utc::now(),
        };

        let pass = async {
            let modules = loader::load_modules(store, course_id).await?;
            let deletions = modules
                .ids()
                .map(|id| prune::delete_module(ctx, id, modules.fields(id).cloned()));
            settle(join_all(deletions).await)?;

            let path = store::course(course_id);
            store.delete(&path).await?;
            journal.overwritten(path, course_doc.fields.clone());
            Ok::<(), PortError>(())
        };

        match pass.await {
            Ok(()) => {
                let summary = tally.summary();
                info!(course_id, ?summary, "Course deleted");
                Ok(summary)
            }
            Err(error) => Err(self.abort(course_id, &journal, error).await),
        }
    }

    async fn abort(&self, course_id: &str, journal: &WriteJournal, error: PortError) -> ReconcileError {
        error!(course_id, error = %error, writes = journal.len(), "Course write failed, rolling back");
        let undo_failures = journal.roll_back(self.store.as_ref()).await;
        if undo_failures > 0 {
            error!(course_id, undo_failures, "Rollback left changes behind");
        }
        ReconcileError::Aborted { error, undo_failures }
    }
}

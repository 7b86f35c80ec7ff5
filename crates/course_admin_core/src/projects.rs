//! crates/course_admin_core/src/projects.rs
//!
//! Project categories, projects, their assignment to users and the review of
//! student submissions.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde_json::{json, Value};
use tracing::{error, info};
use validator::Validate;

use crate::domain::{
    AssignmentSummary, AssignmentSync, CategoryDraft, Project, ProjectCategory, ProjectDraft,
    ResubmissionDraft, ReviewDraft, Submission, SubmissionStatus, UserProject,
};
use crate::ports::{DocumentStore, PortError, PortResult};
use crate::records::{
    CategoryRecord, ProjectRecord, SubmissionRecord, UserProjectRecord, UserRecord,
};
use crate::result::OperationResult;
use crate::store::{self, to_fields, CollectionPath, StoredDocument};

pub struct ProjectService {
    store: Arc<dyn DocumentStore>,
}

/// Logs a failure and folds it into the result envelope.
fn report<T>(context: &str, result: PortResult<T>, message: &str) -> OperationResult<T> {
    match result {
        Ok(data) => OperationResult::ok(message, data),
        Err(e) => {
            error!(error = %e, "{context}");
            OperationResult::from_error(context, &e)
        }
    }
}

impl ProjectService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    //=====================================================================================
    // Categories
    //=====================================================================================

    pub async fn list_categories(&self) -> OperationResult<Vec<ProjectCategory>> {
        let result = async {
            let docs = self.store.list(&store::project_categories(), Some("title")).await?;
            decode_all(&docs, |r: CategoryRecord, id| r.to_domain(id))
        }
        .await;
        report("Failed to fetch categories", result, "Categories loaded")
    }

    pub async fn get_category(&self, category_id: &str) -> OperationResult<ProjectCategory> {
        let result = async {
            let doc = self
                .require(&store::project_categories(), category_id, "Category not found")
                .await?;
            Ok::<_, PortError>(doc.decode::<CategoryRecord>()?.to_domain(&doc.id))
        }
        .await;
        report("Failed to fetch category", result, "Category loaded")
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> OperationResult<ProjectCategory> {
        if let Err(e) = draft.validate() {
            return OperationResult::rejected(&e.into());
        }
        let record = category_record(draft);
        let result = async {
            let id = self
                .store
                .create(&store::project_categories(), to_fields(&record)?)
                .await?;
            info!(category_id = %id, "Category created");
            Ok::<_, PortError>(record.to_domain(&id))
        }
        .await;
        report("Failed to create category", result, "Category created successfully")
    }

    pub async fn update_category(
        &self,
        category_id: &str,
        draft: CategoryDraft,
    ) -> OperationResult<ProjectCategory> {
        if let Err(e) = draft.validate() {
            return OperationResult::rejected(&e.into());
        }
        let record = category_record(draft);
        let result = async {
            self.require(&store::project_categories(), category_id, "Category not found")
                .await?;
            self.store
                .set(
                    &store::project_categories().doc(category_id),
                    to_fields(&record)?,
                )
                .await?;
            Ok::<_, PortError>(record.to_domain(category_id))
        }
        .await;
        report("Failed to update category", result, "Category updated successfully")
    }

    /// Refuses to delete a category that still has projects.
    pub async fn delete_category(&self, category_id: &str) -> OperationResult<()> {
        let result = async {
            self.require(&store::project_categories(), category_id, "Category not found")
                .await?;
            let in_use = self
                .store
                .list_where(&store::projects(), "categoryId", &json!(category_id))
                .await?;
            if !in_use.is_empty() {
                return Err(PortError::Conflict(format!(
                    "Category is used by {} project(s)",
                    in_use.len()
                )));
            }
            self.store
                .delete(&store::project_categories().doc(category_id))
                .await
        }
        .await;
        report("Failed to delete category", result, "Category deleted successfully")
    }

    //=====================================================================================
    // Projects
    //=====================================================================================

    /// Lists projects with the title of their category filled in.
    pub async fn list_projects(&self) -> OperationResult<Vec<Project>> {
        let result = async {
            let categories: HashMap<String, String> = self
                .store
                .list(&store::project_categories(), None)
                .await?
                .iter()
                .map(|doc| Ok::<_, PortError>((doc.id.clone(), doc.decode::<CategoryRecord>()?.title)))
                .collect::<PortResult<_>>()?;
            let docs = self.store.list(&store::projects(), Some("title")).await?;
            decode_all(&docs, |record: ProjectRecord, id| {
                let mut project = record.to_domain(id);
                project.category_title = categories.get(&project.category_id).cloned();
                project
            })
        }
        .await;
        report("Failed to fetch projects", result, "Projects loaded")
    }

    pub async fn get_project(&self, project_id: &str) -> OperationResult<Project> {
        let result = async {
            let doc = self
                .require(&store::projects(), project_id, "Project not found")
                .await?;
            let mut project = doc.decode::<ProjectRecord>()?.to_domain(&doc.id);
            if let Some(category) = self
                .store
                .get(&store::project_categories().doc(project.category_id.clone()))
                .await?
            {
                project.category_title = Some(category.decode::<CategoryRecord>()?.title);
            }
            Ok::<_, PortError>(project)
        }
        .await;
        report("Failed to fetch project", result, "Project loaded")
    }

    pub async fn create_project(&self, draft: ProjectDraft) -> OperationResult<Project> {
        let result = async {
            let record = self.project_record(draft).await?;
            let id = self.store.create(&store::projects(), to_fields(&record)?).await?;
            info!(project_id = %id, "Project created");
            Ok::<_, PortError>(record.to_domain(&id))
        }
        .await;
        report("Failed to create project", result, "Project created successfully")
    }

    pub async fn update_project(
        &self,
        project_id: &str,
        draft: ProjectDraft,
    ) -> OperationResult<Project> {
        let result = async {
            self.require(&store::projects(), project_id, "Project not found")
                .await?;
            let record = self.project_record(draft).await?;
            self.store
                .set(&store::projects().doc(project_id), to_fields(&record)?)
                .await?;
            Ok::<_, PortError>(record.to_domain(project_id))
        }
        .await;
        report("Failed to update project", result, "Project updated successfully")
    }

    /// Deletes the project and every assignment of it.
    pub async fn delete_project(&self, project_id: &str) -> OperationResult<()> {
        let result = async {
            self.require(&store::projects(), project_id, "Project not found")
                .await?;
            let assignments = self
                .store
                .list_where(&store::user_projects(), "projectId", &json!(project_id))
                .await?;
            try_join_all(assignments.iter().map(|doc| async move {
                self.store
                    .delete(&store::user_projects().doc(doc.id.clone()))
                    .await
            }))
            .await?;
            self.store.delete(&store::projects().doc(project_id)).await?;
            info!(project_id, assignments = assignments.len(), "Project deleted");
            Ok::<_, PortError>(())
        }
        .await;
        report("Failed to delete project", result, "Project deleted successfully")
    }

    /// Validates a draft, drops blank list items and checks the category.
    async fn project_record(&self, draft: ProjectDraft) -> PortResult<ProjectRecord> {
        draft.validate()?;
        let record = ProjectRecord {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            category_id: draft.category_id,
            objectives: non_blank(draft.objectives),
            learning_outcomes: non_blank(draft.learning_outcomes),
            deliverables: non_blank(draft.deliverables),
            tools_and_technologies: non_blank(draft.tools_and_technologies),
            project_brief_url: draft.project_brief_url.filter(|s| !s.trim().is_empty()),
            submission_process: draft.submission_process.filter(|s| !s.trim().is_empty()),
            support_info: draft.support_info.filter(|s| !s.trim().is_empty()),
            video_guidelines: draft.video_guidelines.filter(|s| !s.trim().is_empty()),
        };
        for (items, label) in [
            (&record.objectives, "objective"),
            (&record.learning_outcomes, "learning outcome"),
            (&record.deliverables, "deliverable"),
            (&record.tools_and_technologies, "tool or technology"),
        ] {
            if items.is_empty() {
                return Err(PortError::Validation(format!("Add at least one {label}")));
            }
        }
        self.require(&store::project_categories(), &record.category_id, "Category not found")
            .await?;
        Ok(record)
    }

    //=====================================================================================
    // Assignments
    //=====================================================================================

    pub async fn list_assignments(
        &self,
        project_id: Option<&str>,
    ) -> OperationResult<Vec<UserProject>> {
        let result = async {
            let docs = match project_id {
                Some(id) => {
                    self.store
                        .list_where(&store::user_projects(), "projectId", &json!(id))
                        .await?
                }
                None => self.store.list(&store::user_projects(), Some("assignedAt")).await?,
            };
            decode_all(&docs, |r: UserProjectRecord, id| r.to_domain(id))
        }
        .await;
        report("Failed to fetch assignments", result, "Assignments loaded")
    }

    /// Makes the assigned users of every listed project exactly `user_ids`.
    pub async fn sync_assignments(&self, sync: AssignmentSync) -> OperationResult<AssignmentSummary> {
        if let Err(e) = sync.validate() {
            return OperationResult::rejected(&e.into());
        }
        let target: BTreeSet<&str> = sync.user_ids.iter().map(String::as_str).collect();
        let result = async {
            for project_id in &sync.project_ids {
                self.require(&store::projects(), project_id, "Project not found")
                    .await?;
            }
            let per_project = sync
                .project_ids
                .iter()
                .map(|project_id| self.sync_project(project_id, &target));
            let summaries = try_join_all(per_project).await?;
            Ok::<_, PortError>(summaries
                .into_iter()
                .fold(AssignmentSummary::default(), |total, s| AssignmentSummary {
                    added: total.added + s.added,
                    removed: total.removed + s.removed,
                }))
        }
        .await;
        if let Ok(summary) = &result {
            info!(projects = sync.project_ids.len(), ?summary, "Assignments synced");
        }
        report("Failed to save assignments", result, "Assignments saved successfully")
    }

    async fn sync_project(
        &self,
        project_id: &str,
        target: &BTreeSet<&str>,
    ) -> PortResult<AssignmentSummary> {
        let existing = self
            .store
            .list_where(&store::user_projects(), "projectId", &json!(project_id))
            .await?;
        let mut current = BTreeSet::new();
        let mut stale = Vec::new();
        for doc in &existing {
            let record: UserProjectRecord = doc.decode()?;
            if target.contains(record.user_id.as_str()) && current.insert(record.user_id) {
                continue;
            }
            stale.push(doc.id.clone());
        }
        let now = Utc::now();
        let additions = target
            .iter()
            .filter(|user_id| !current.contains(**user_id))
            .map(|user_id| {
                let record = UserProjectRecord {
                    user_id: user_id.to_string(),
                    project_id: project_id.to_string(),
                    assigned_at: now,
                };
                async move {
                    self.store
                        .create(&store::user_projects(), to_fields(&record)?)
                        .await
                }
            });
        let added = try_join_all(additions).await?.len();
        try_join_all(stale.iter().map(|id| async move {
            self.store.delete(&store::user_projects().doc(id.clone())).await
        }))
        .await?;
        Ok(AssignmentSummary {
            added,
            removed: stale.len(),
        })
    }

    //=====================================================================================
    // Submissions
    //=====================================================================================

    /// Lists submissions newest first, with the submitter's email when known.
    pub async fn list_submissions(
        &self,
        project_id: Option<&str>,
    ) -> OperationResult<Vec<Submission>> {
        let result = async {
            let docs = match project_id {
                Some(id) => {
                    self.store
                        .list_where(&store::submissions(), "projectId", &json!(id))
                        .await?
                }
                None => self.store.list(&store::submissions(), None).await?,
            };
            let emails: HashMap<String, String> = self
                .store
                .list(&store::users(), None)
                .await?
                .iter()
                .filter_map(|doc| {
                    let record = doc.decode::<UserRecord>().ok()?;
                    Some((doc.id.clone(), record.email))
                })
                .collect();
            let mut submissions = decode_all(&docs, |record: SubmissionRecord, id| {
                let mut submission = record.to_domain(id);
                submission.user_email = emails.get(&submission.user_id).cloned();
                submission
            })?;
            submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
            Ok::<_, PortError>(submissions)
        }
        .await;
        report("Failed to fetch submissions", result, "Submissions loaded")
    }

    /// Grades a submission, or returns it to the student for another attempt.
    pub async fn review_submission(
        &self,
        submission_id: &str,
        review: ReviewDraft,
    ) -> OperationResult<Submission> {
        if let Err(e) = review.validate() {
            return OperationResult::rejected(&e.into());
        }
        let result = async {
            let mut record = self.submission(submission_id).await?;
            if !record.status.can_review() {
                return Err(PortError::Conflict(
                    "Submission is waiting for the student to resubmit".to_string(),
                ));
            }
            let now = Utc::now();
            record.feedback = Some(review.feedback.trim().to_string()).filter(|f| !f.is_empty());
            record.grade = review.grade;
            if review.require_resubmission {
                record.status = SubmissionStatus::Returned;
                record.resubmission_allowed = true;
                record.returned_at = Some(now);
            } else {
                record.status = SubmissionStatus::Reviewed;
                record.resubmission_allowed = false;
            }
            let patch = json!({
                "status": record.status,
                "feedback": record.feedback,
                "grade": record.grade,
                "resubmissionAllowed": record.resubmission_allowed,
                "returnedAt": record.returned_at,
                "reviewedAt": now,
            });
            self.patch_submission(submission_id, patch).await?;
            info!(submission_id, status = ?record.status, "Submission reviewed");
            Ok::<_, PortError>(record.to_domain(submission_id))
        }
        .await;
        report("Failed to update submission", result, "Submission updated successfully")
    }

    /// Replaces the links of a returned submission and puts it back in the
    /// review queue.
    pub async fn resubmit(
        &self,
        submission_id: &str,
        links: ResubmissionDraft,
    ) -> OperationResult<Submission> {
        if let Err(e) = links.validate() {
            return OperationResult::rejected(&e.into());
        }
        let result = async {
            let mut record = self.submission(submission_id).await?;
            if !(record.status.can_resubmit() && record.resubmission_allowed) {
                return Err(PortError::Conflict(
                    "Submission is not open for resubmission".to_string(),
                ));
            }
            let now = Utc::now();
            record.github_url = links.github_url;
            record.drive_url = links.drive_url;
            record.video_url = links.video_url;
            record.comments = links.comments;
            record.status = SubmissionStatus::Resubmitted;
            record.resubmission_allowed = false;
            record.resubmitted_at = Some(now);
            let patch = json!({
                "githubUrl": record.github_url,
                "driveUrl": record.drive_url,
                "videoUrl": record.video_url,
                "comments": record.comments,
                "status": record.status,
                "resubmissionAllowed": false,
                "resubmittedAt": now,
            });
            self.patch_submission(submission_id, patch).await?;
            info!(submission_id, "Submission resubmitted");
            Ok::<_, PortError>(record.to_domain(submission_id))
        }
        .await;
        report("Failed to resubmit", result, "Submission resubmitted successfully")
    }

    async fn submission(&self, submission_id: &str) -> PortResult<SubmissionRecord> {
        self.require(&store::submissions(), submission_id, "Submission not found")
            .await?
            .decode()
    }

    async fn patch_submission(&self, submission_id: &str, patch: Value) -> PortResult<()> {
        self.store
            .update(&store::submissions().doc(submission_id), to_fields(&patch)?)
            .await
    }

    async fn require(
        &self,
        collection: &CollectionPath,
        id: &str,
        missing: &str,
    ) -> PortResult<StoredDocument> {
        self.store
            .get(&collection.doc(id))
            .await?
            .ok_or_else(|| PortError::NotFound(missing.to_string()))
    }
}

fn category_record(draft: CategoryDraft) -> CategoryRecord {
    CategoryRecord {
        title: draft.title.trim().to_string(),
        description: draft.description.trim().to_string(),
        image_url: draft.image_url.filter(|s| !s.trim().is_empty()),
    }
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn decode_all<R, T, F>(docs: &[StoredDocument], convert: F) -> PortResult<Vec<T>>
where
    R: serde::de::DeserializeOwned,
    F: Fn(R, &str) -> T,
{
    docs.iter()
        .map(|doc| Ok::<_, PortError>(convert(doc.decode::<R>()?, &doc.id)))
        .collect()
}

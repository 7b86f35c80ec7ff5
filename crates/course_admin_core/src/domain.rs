//! crates/course_admin_core/src/domain.rs
//!
//! Defines the core data structures of the admin application: the course tree,
//! the desired-state drafts the reconciler consumes, users and the projects
//! mini-domain. These types are shared by the services and the HTTP layer; the
//! persisted document shapes live in `records.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::records::{total_duration, DURATION_OVERFLOW};

//=========================================================================================
// Courses
//=========================================================================================

/// Publication state of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    #[default]
    Draft,
    Active,
    Published,
    Archived,
}

/// A reference to a video hosted by an external provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Video {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Length in seconds.
    #[serde(default)]
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub main_title: String,
    pub description: Option<String>,
    pub status: CourseStatus,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub module_name: String,
    pub description: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub order: i64,
    pub videos: Vec<Video>,
    /// Single-video reference kept for readers that predate `videos`.
    pub video_id: Option<String>,
    /// Sum of the durations of `videos`, in seconds.
    pub duration: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A module together with its sections, sorted by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModuleTree {
    #[serde(flatten)]
    pub module: Module,
    pub sections: Vec<Section>,
}

/// A course together with its modules, sorted by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CourseTree {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<ModuleTree>,
}

/// The minimal course projection used by entitlement pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CourseOption {
    pub id: String,
    pub main_title: String,
}

//=========================================================================================
// Desired-State Drafts (input of the reconciler)
//=========================================================================================

/// Identity of an entity in a desired-state tree.
///
/// `Temporary` carries a client-side label and never addresses a stored
/// document; `Persisted` carries an id the client read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum DraftId {
    Temporary(String),
    Persisted(String),
}

impl Default for DraftId {
    fn default() -> Self {
        DraftId::Temporary(String::new())
    }
}

impl DraftId {
    pub fn temporary(label: impl Into<String>) -> Self {
        DraftId::Temporary(label.into())
    }

    pub fn persisted(id: impl Into<String>) -> Self {
        DraftId::Persisted(id.into())
    }

    /// The store id this draft claims to have, if any.
    pub fn persisted_id(&self) -> Option<&str> {
        match self {
            DraftId::Persisted(id) => Some(id),
            DraftId::Temporary(_) => None,
        }
    }
}

/// The full desired state of a course as submitted by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    #[validate(length(min = 1, message = "Course title is required"))]
    pub main_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<CourseStatus>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub modules: Vec<ModuleDraft>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ModuleDraft {
    #[serde(default)]
    pub id: DraftId,
    #[validate(length(min = 1, message = "Module name is required"))]
    pub module_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to the module's position in the draft when absent.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    #[validate(nested)]
    pub sections: Vec<SectionDraft>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SectionDraft {
    #[serde(default)]
    pub id: DraftId,
    #[validate(length(min = 1, message = "Section title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    #[validate(custom(function = "fits_duration"))]
    pub videos: Option<Vec<Video>>,
    #[serde(default)]
    pub video_id: Option<String>,
}

fn fits_duration(videos: &[Video]) -> Result<(), ValidationError> {
    match total_duration(videos) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("duration").with_message(DURATION_OVERFLOW.into())),
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub course_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a student account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "Please select at least one course"))]
    pub course_ids: Vec<String>,
}

/// Role of an identity account. Only admins may sign in to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Student,
}

//=========================================================================================
// Projects
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProjectCategory {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    #[validate(length(min = 1, message = "Category title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    /// Title of the owning category, filled in when listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_title: Option<String>,
    pub objectives: Vec<String>,
    pub learning_outcomes: Vec<String>,
    pub deliverables: Vec<String>,
    pub tools_and_technologies: Vec<String>,
    pub project_brief_url: Option<String>,
    pub submission_process: Option<String>,
    pub support_info: Option<String>,
    pub video_guidelines: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[validate(length(min = 1, message = "Project title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Project description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "A category is required"))]
    pub category_id: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub learning_outcomes: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub tools_and_technologies: Vec<String>,
    #[serde(default)]
    pub project_brief_url: Option<String>,
    #[serde(default)]
    pub submission_process: Option<String>,
    #[serde(default)]
    pub support_info: Option<String>,
    #[serde(default)]
    pub video_guidelines: Option<String>,
}

/// Join record assigning a project to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProject {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub assigned_at: DateTime<Utc>,
}

/// Target assignment state: every listed project ends up assigned to exactly
/// the listed users.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSync {
    #[validate(length(min = 1, message = "Select at least one project"))]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AssignmentSummary {
    pub added: usize,
    pub removed: usize,
}

/// Review state of a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Submitted,
    Reviewed,
    Returned,
    Resubmitted,
}

impl SubmissionStatus {
    /// A returned submission waits on the student; everything else can be
    /// (re)graded.
    pub fn can_review(self) -> bool {
        !matches!(self, SubmissionStatus::Returned)
    }

    pub fn can_resubmit(self) -> bool {
        matches!(self, SubmissionStatus::Returned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub project_id: String,
    pub github_url: String,
    pub drive_url: String,
    pub video_url: Option<String>,
    pub comments: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub grade: Option<u32>,
    pub resubmission_allowed: bool,
    pub returned_at: Option<DateTime<Utc>>,
    pub resubmitted_at: Option<DateTime<Utc>>,
    pub previous_version_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    #[serde(default)]
    pub feedback: String,
    #[validate(range(max = 100, message = "Grade must be between 0 and 100"))]
    #[serde(default)]
    pub grade: Option<u32>,
    #[serde(default)]
    pub require_resubmission: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ResubmissionDraft {
    #[validate(url(message = "A valid repository link is required"))]
    pub github_url: String,
    #[validate(url(message = "A valid drive link is required"))]
    pub drive_url: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_ids_deserialize_from_tagged_objects() {
        let json = r#"{"moduleName":"Intro","id":{"temporary":"module-17"}}"#;
        let draft: ModuleDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.id, DraftId::temporary("module-17"));
        assert_eq!(draft.id.persisted_id(), None);

        let json = r#"{"moduleName":"Intro","id":{"persisted":"abc"}}"#;
        let draft: ModuleDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.id.persisted_id(), Some("abc"));
    }

    #[test]
    fn a_persisted_id_with_a_reserved_looking_prefix_is_still_persisted() {
        let id = DraftId::persisted("module-1700000000");
        assert_eq!(id.persisted_id(), Some("module-1700000000"));
    }

    #[test]
    fn missing_draft_id_means_new() {
        let draft: SectionDraft = serde_json::from_str(r#"{"title":"Setup"}"#).unwrap();
        assert_eq!(draft.id, DraftId::default());
        assert!(draft.id.persisted_id().is_none());
    }

    #[test]
    fn section_durations_must_fit_in_a_total() {
        let endless = |second: u64| SectionDraft {
            title: "Endless".into(),
            videos: Some(vec![
                Video { id: "a".into(), name: None, duration: u64::MAX },
                Video { id: "b".into(), name: None, duration: second },
            ]),
            ..Default::default()
        };
        assert!(endless(0).validate().is_ok());
        let errors = endless(1).validate().unwrap_err();
        assert!(errors.to_string().contains(DURATION_OVERFLOW), "{errors}");
    }

    #[test]
    fn nested_validation_reaches_sections() {
        let draft = CourseDraft {
            main_title: "Rust".into(),
            modules: vec![ModuleDraft {
                module_name: "Intro".into(),
                sections: vec![SectionDraft::default()],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn submission_review_transitions() {
        assert!(SubmissionStatus::Submitted.can_review());
        assert!(SubmissionStatus::Resubmitted.can_review());
        assert!(SubmissionStatus::Reviewed.can_review());
        assert!(!SubmissionStatus::Returned.can_review());
        assert!(SubmissionStatus::Returned.can_resubmit());
        assert!(!SubmissionStatus::Submitted.can_resubmit());
    }
}

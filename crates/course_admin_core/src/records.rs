//! crates/course_admin_core/src/records.rs
//!
//! The persisted shapes of every document kind, as they sit in the document
//! store. Each record converts into its domain type with `to_domain(id)`; the
//! `*Patch` structs are the partial writes used by in-place updates.
//!
//! Readers are lenient (older documents may miss fields); writers always emit
//! the full current shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Course, CourseStatus, Module, Project, ProjectCategory, Section, SectionDraft, Submission,
    SubmissionStatus, User, UserProject, Video,
};
use crate::ports::{PortError, PortResult};

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

//=========================================================================================
// Course tree
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    #[serde(default)]
    pub main_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
}

impl CourseRecord {
    pub fn to_domain(self, id: &str) -> Course {
        Course {
            id: id.to_string(),
            main_title: self.main_title,
            description: self.description,
            status: self.status,
            thumbnail: self.thumbnail,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Top-level course attributes rewritten by every update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    pub main_title: String,
    pub description: Option<String>,
    pub status: CourseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    #[serde(default)]
    pub module_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
}

impl ModuleRecord {
    pub fn to_domain(self, id: &str) -> Module {
        Module {
            id: id.to_string(),
            module_name: self.module_name,
            description: self.description,
            order: self.order,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePatch {
    pub module_name: String,
    pub description: Option<String>,
    pub order: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub videos: Vec<Video>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
}

impl SectionRecord {
    /// Converts to the domain shape. A legacy document that only carries
    /// `videoId` reads as a single video lasting the stored section duration.
    pub fn to_domain(self, id: &str) -> Section {
        let mut videos = self.videos;
        if videos.is_empty() {
            if let Some(video_id) = self.video_id.as_ref().filter(|v| !v.is_empty()) {
                videos.push(Video {
                    id: video_id.clone(),
                    name: None,
                    duration: self.duration.unwrap_or(0),
                });
            }
        }
        Section {
            id: id.to_string(),
            title: self.title,
            description: self.description,
            order: self.order,
            duration: total_duration(&videos).unwrap_or(u64::MAX),
            videos,
            video_id: self.video_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Section fields written on every create or update. `videos` always replaces
/// the stored list and `duration` is always recomputed from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    pub title: String,
    pub description: Option<String>,
    pub order: i64,
    pub videos: Vec<Video>,
    pub video_id: Option<String>,
    pub duration: u64,
    pub updated_at: DateTime<Utc>,
}

impl SectionPatch {
    pub fn from_draft(draft: &SectionDraft, order: i64, now: DateTime<Utc>) -> PortResult<Self> {
        let video_id = draft.video_id.clone().filter(|id| !id.is_empty());
        let videos = match &draft.videos {
            Some(videos) if !videos.is_empty() => videos.clone(),
            _ => video_id
                .iter()
                .map(|id| Video {
                    id: id.clone(),
                    name: None,
                    duration: 0,
                })
                .collect(),
        };
        let video_id = video_id.or_else(|| videos.first().map(|v| v.id.clone()));
        let duration = total_duration(&videos)
            .ok_or_else(|| PortError::Validation(DURATION_OVERFLOW.to_string()))?;
        Ok(Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            order,
            duration,
            videos,
            video_id,
            updated_at: now,
        })
    }
}

pub const DURATION_OVERFLOW: &str = "Video durations are too large";

/// Sum of the video lengths, or `None` when it does not fit in a `u64`.
pub fn total_duration(videos: &[Video]) -> Option<u64> {
    videos
        .iter()
        .try_fold(0u64, |total, video| total.checked_add(video.duration))
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub course_ids: Vec<String>,
    #[serde(default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unix_epoch")]
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn to_domain(self, id: &str) -> User {
        User {
            id: id.to_string(),
            email: self.email,
            course_ids: self.course_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCoursesPatch {
    pub course_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Projects
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CategoryRecord {
    pub fn to_domain(self, id: &str) -> ProjectCategory {
        ProjectCategory {
            id: id.to_string(),
            title: self.title,
            description: self.description,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
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

impl ProjectRecord {
    pub fn to_domain(self, id: &str) -> Project {
        Project {
            id: id.to_string(),
            title: self.title,
            description: self.description,
            category_id: self.category_id,
            category_title: None,
            objectives: self.objectives,
            learning_outcomes: self.learning_outcomes,
            deliverables: self.deliverables,
            tools_and_technologies: self.tools_and_technologies,
            project_brief_url: self.project_brief_url,
            submission_process: self.submission_process,
            support_info: self.support_info,
            video_guidelines: self.video_guidelines,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjectRecord {
    pub user_id: String,
    pub project_id: String,
    #[serde(default = "unix_epoch")]
    pub assigned_at: DateTime<Utc>,
}

impl UserProjectRecord {
    pub fn to_domain(self, id: &str) -> UserProject {
        UserProject {
            id: id.to_string(),
            user_id: self.user_id,
            project_id: self.project_id,
            assigned_at: self.assigned_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub user_id: String,
    pub project_id: String,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub drive_url: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default = "unix_epoch")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub grade: Option<u32>,
    #[serde(default)]
    pub resubmission_allowed: bool,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resubmitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub previous_version_id: Option<String>,
}

impl SubmissionRecord {
    pub fn to_domain(self, id: &str) -> Submission {
        Submission {
            id: id.to_string(),
            user_id: self.user_id,
            user_email: None,
            project_id: self.project_id,
            github_url: self.github_url,
            drive_url: self.drive_url,
            video_url: self.video_url,
            comments: self.comments,
            submitted_at: self.submitted_at,
            status: self.status,
            feedback: self.feedback,
            grade: self.grade,
            resubmission_allowed: self.resubmission_allowed,
            returned_at: self.returned_at,
            resubmitted_at: self.resubmitted_at,
            previous_version_id: self.previous_version_id,
        }
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use course_admin_core::domain::{
    AccountRole, CourseDraft, CourseTree, DraftId, ModuleDraft, SectionDraft, Video,
};
use course_admin_core::{
    Account, BlobStorage, CourseService, IdentityService, InMemoryDocumentStore, MailMessage,
    MailTransport, PortError, PortResult,
};

pub fn video(id: &str, duration: u64) -> Video {
    Video {
        id: id.to_string(),
        name: None,
        duration,
    }
}

pub fn section(label: &str, title: &str, videos: Vec<Video>) -> SectionDraft {
    SectionDraft {
        id: DraftId::temporary(label),
        title: title.to_string(),
        videos: Some(videos),
        ..Default::default()
    }
}

pub fn module(label: &str, name: &str, sections: Vec<SectionDraft>) -> ModuleDraft {
    ModuleDraft {
        id: DraftId::temporary(label),
        module_name: name.to_string(),
        sections,
        ..Default::default()
    }
}

pub fn course(title: &str, modules: Vec<ModuleDraft>) -> CourseDraft {
    CourseDraft {
        main_title: title.to_string(),
        modules,
        ..Default::default()
    }
}

/// Rebuilds the draft an editor would submit after loading `tree`.
pub fn draft_of(tree: &CourseTree) -> CourseDraft {
    CourseDraft {
        main_title: tree.course.main_title.clone(),
        description: tree.course.description.clone(),
        status: Some(tree.course.status),
        thumbnail: tree.course.thumbnail.clone(),
        modules: tree
            .modules
            .iter()
            .map(|m| ModuleDraft {
                id: DraftId::persisted(&m.module.id),
                module_name: m.module.module_name.clone(),
                description: m.module.description.clone(),
                order: Some(m.module.order),
                sections: m
                    .sections
                    .iter()
                    .map(|s| SectionDraft {
                        id: DraftId::persisted(&s.id),
                        title: s.title.clone(),
                        description: s.description.clone(),
                        order: Some(s.order),
                        videos: Some(s.videos.clone()),
                        video_id: s.video_id.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// The shape of a tree without timestamps, for before/after comparisons.
pub fn outline(tree: &CourseTree) -> Vec<(String, String, i64, Vec<(String, String, i64, u64)>)> {
    tree.modules
        .iter()
        .map(|m| {
            (
                m.module.id.clone(),
                m.module.module_name.clone(),
                m.module.order,
                m.sections
                    .iter()
                    .map(|s| (s.id.clone(), s.title.clone(), s.order, s.duration))
                    .collect(),
            )
        })
        .collect()
}

pub struct Harness {
    pub store: Arc<InMemoryDocumentStore>,
    pub courses: CourseService,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryDocumentStore::new());
    let courses = CourseService::new(store.clone(), Arc::new(FakeBlobs::default()));
    Harness { store, courses }
}

impl Harness {
    pub async fn create(&self, draft: CourseDraft) -> String {
        let result = self.courses.create_course(draft).await;
        assert!(result.success, "{}", result.message);
        result.data.unwrap().course_id
    }

    pub async fn tree(&self, course_id: &str) -> CourseTree {
        let result = self.courses.get_course(course_id).await;
        assert!(result.success, "{}", result.message);
        result.data.unwrap()
    }
}

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
pub struct FakeBlobs {
    pub saved: Mutex<Vec<(usize, String)>>,
}

#[async_trait]
impl BlobStorage for FakeBlobs {
    async fn save(&self, bytes: &[u8], content_type: &str) -> PortResult<String> {
        let mut saved = self.saved.lock().unwrap();
        saved.push((bytes.len(), content_type.to_string()));
        Ok(format!("http://media.test/{}", saved.len()))
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub accounts: Mutex<HashMap<String, (String, String, AccountRole)>>,
    pub fail_deletes: AtomicBool,
    next_id: Mutex<usize>,
}

impl FakeIdentity {
    pub fn with_account(self, id: &str, email: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            id.to_string(),
            (email.to_string(), "secret1".to_string(), AccountRole::Student),
        );
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(id)
    }
}

#[async_trait]
impl IdentityService for FakeIdentity {
    async fn create_user(&self, email: &str, password: &str, role: AccountRole) -> PortResult<String> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|(e, _, _)| e == email) {
            return Err(PortError::Conflict(format!("{email} is taken")));
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("uid-{next}");
        accounts.insert(id.clone(), (email.to_string(), password.to_string(), role));
        Ok(id)
    }

    async fn delete_user(&self, user_id: &str) -> PortResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("identity backend unavailable".into()));
        }
        match self.accounts.lock().unwrap().remove(user_id) {
            Some(_) => Ok(()),
            None => Err(PortError::NotFound(user_id.to_string())),
        }
    }

    async fn get_user(&self, user_id: &str) -> PortResult<Account> {
        self.accounts
            .lock()
            .unwrap()
            .get(user_id)
            .map(|(email, _, role)| Account {
                id: user_id.to_string(),
                email: email.clone(),
                role: *role,
            })
            .ok_or_else(|| PortError::NotFound(user_id.to_string()))
    }

    async fn generate_password_reset_link(&self, email: &str) -> PortResult<String> {
        Ok(format!("http://reset.test/?email={email}"))
    }

    async fn complete_password_reset(&self, _token: &str, _new_password: &str) -> PortResult<()> {
        Err(PortError::Unauthorized)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> PortResult<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(_, (e, p, _))| e == email && p == password)
            .map(|(id, (email, _, role))| Account {
                id: id.clone(),
                email: email.clone(),
                role: *role,
            })
            .ok_or(PortError::Unauthorized)
    }

    async fn create_session(&self, user_id: &str, _expires_at: DateTime<Utc>) -> PortResult<String> {
        Ok(format!("session-{user_id}"))
    }

    async fn validate_session(&self, session_id: &str) -> PortResult<String> {
        session_id
            .strip_prefix("session-")
            .map(str::to_string)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_session(&self, _session_id: &str) -> PortResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMail {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMail {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMail {
    async fn send(&self, message: MailMessage) -> PortResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("smtp down".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

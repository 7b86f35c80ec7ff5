//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use course_admin_core::ports::{BlobStorage, DocumentStore, IdentityService, MailTransport};
use course_admin_core::{CourseService, ProjectService, UserService};

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityService>,
    pub courses: CourseService,
    pub users: UserService,
    pub projects: ProjectService,
}

impl AppState {
    /// Wires the core services onto the given adapters.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityService>,
        blobs: Arc<dyn BlobStorage>,
        mail: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            courses: CourseService::new(store.clone(), blobs),
            users: UserService::new(store.clone(), identity.clone(), mail),
            projects: ProjectService::new(store),
            identity,
            config,
        }
    }
}

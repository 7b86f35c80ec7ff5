//! crates/course_admin_core/src/users.rs
//!
//! Student accounts. A user exists twice: as an identity account (credentials)
//! and as a `users/{uid}` document holding course entitlements. The service
//! keeps both sides consistent, undoing the first write when the second fails.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use crate::domain::{AccountRole, NewUser, User};
use crate::notifications;
use crate::ports::{DocumentStore, IdentityService, MailTransport, PortError, PortResult};
use crate::records::{CourseRecord, UserCoursesPatch, UserRecord};
use crate::result::{FailureKind, OperationResult};
use crate::store::{self, to_fields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub user_id: String,
}

pub struct UserService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityService>,
    mail: Arc<dyn MailTransport>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityService>,
        mail: Arc<dyn MailTransport>,
    ) -> Self {
        Self { store, identity, mail }
    }

    pub async fn create_user(&self, new_user: NewUser) -> OperationResult<CreatedUser> {
        if let Err(e) = new_user.validate() {
            return OperationResult::rejected(&e.into());
        }

        let user_id = match self
            .identity
            .create_user(&new_user.email, &new_user.password, AccountRole::Student)
            .await
        {
            Ok(id) => id,
            Err(PortError::Conflict(_)) => {
                return OperationResult::failure(FailureKind::Conflict, "Email is already in use")
            }
            Err(e) => {
                error!(email = %new_user.email, error = %e, "Failed to create identity account");
                return OperationResult::from_error("Failed to create user", &e);
            }
        };

        let now = Utc::now();
        let record = UserRecord {
            email: new_user.email.clone(),
            course_ids: new_user.course_ids.clone(),
            created_at: now,
            updated_at: now,
        };
        let written = async {
            self.store
                .set(&store::users().doc(user_id.clone()), to_fields(&record)?)
                .await
        }
        .await;
        if let Err(e) = written {
            error!(user_id = %user_id, error = %e, "Failed to write user document, removing account");
            if let Err(undo) = self.identity.delete_user(&user_id).await {
                error!(user_id = %user_id, error = %undo, "Orphaned identity account left behind");
            }
            return OperationResult::from_error("Failed to create user", &e);
        }

        info!(user_id = %user_id, courses = new_user.course_ids.len(), "User created");
        self.send_welcome(&new_user.email, &new_user.course_ids).await;
        OperationResult::ok("User created successfully", CreatedUser { user_id })
    }

    pub async fn list_users(&self) -> OperationResult<Vec<User>> {
        let result = async {
            self.store
                .list(&store::users(), None)
                .await?
                .iter()
                .map(|doc| Ok::<_, PortError>(doc.decode::<UserRecord>()?.to_domain(&doc.id)))
                .collect::<PortResult<Vec<_>>>()
        }
        .await;
        match result {
            Ok(users) => OperationResult::ok("Users loaded", users),
            Err(e) => {
                error!(error = %e, "Failed to fetch users");
                OperationResult::from_error("Failed to fetch users", &e)
            }
        }
    }

    pub async fn update_user_courses(
        &self,
        user_id: &str,
        course_ids: Vec<String>,
    ) -> OperationResult<()> {
        let path = store::users().doc(user_id);
        let result = async {
            if self.store.get(&path).await?.is_none() {
                return Err(PortError::NotFound("User not found".to_string()));
            }
            let patch = UserCoursesPatch {
                course_ids,
                updated_at: Utc::now(),
            };
            self.store.update(&path, to_fields(&patch)?).await
        }
        .await;
        match result {
            Ok(()) => OperationResult::done("User courses updated successfully"),
            Err(e) => {
                error!(user_id, error = %e, "Failed to update user courses");
                OperationResult::from_error("Failed to update user courses", &e)
            }
        }
    }

    /// Deletes the user document, then the identity account. When the account
    /// cannot be removed the document is put back.
    pub async fn delete_user(&self, user_id: &str) -> OperationResult<()> {
        let path = store::users().doc(user_id);
        let previous = match self.store.get(&path).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return OperationResult::failure(FailureKind::NotFound, "User not found"),
            Err(e) => return OperationResult::from_error("Failed to delete user", &e),
        };
        if let Err(e) = self.store.delete(&path).await {
            error!(user_id, error = %e, "Failed to delete user document");
            return OperationResult::from_error("Failed to delete user", &e);
        }

        match self.identity.delete_user(user_id).await {
            Ok(()) => {
                info!(user_id, "User deleted");
                OperationResult::done("User deleted successfully")
            }
            Err(PortError::NotFound(_)) => {
                warn!(user_id, "User had no identity account");
                OperationResult::done(
                    "User deleted from database only (not found in authentication system)",
                )
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to delete identity account, restoring document");
                if let Err(undo) = self.store.set(&path, previous.fields).await {
                    error!(user_id, error = %undo, "Failed to restore user document");
                }
                OperationResult::from_error("Failed to delete user", &e)
            }
        }
    }

    /// Mails a password reset link, provided `email` is the address of the
    /// account behind `user_id`.
    pub async fn send_password_reset(&self, user_id: &str, email: &str) -> OperationResult<()> {
        if email.trim().is_empty() {
            return OperationResult::failure(FailureKind::Validation, "Email is required");
        }
        let result = async {
            let account = self.identity.get_user(user_id).await?;
            if !account.email.eq_ignore_ascii_case(email) {
                return Err(PortError::Validation("User email mismatch".to_string()));
            }
            let link = self.identity.generate_password_reset_link(&account.email).await?;
            self.mail
                .send(notifications::password_reset_email(&account.email, &link))
                .await
        }
        .await;
        match result {
            Ok(()) => {
                info!(user_id, "Password reset email sent");
                OperationResult::done("Password reset email sent successfully")
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to send password reset");
                OperationResult::from_error("Failed to send password reset email", &e)
            }
        }
    }

    /// Best effort: a failed welcome email never fails account creation.
    async fn send_welcome(&self, email: &str, course_ids: &[String]) {
        let lookups = course_ids
            .iter()
            .map(|id| async move { self.store.get(&store::course(id)).await });
        let titles: Vec<String> = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|doc| match doc {
                Ok(Some(doc)) => doc.decode::<CourseRecord>().ok().map(|c| c.main_title),
                Ok(None) => None,
                Err(e) => {
                    warn!(error = %e, "Failed to load course for welcome email");
                    None
                }
            })
            .collect();
        if let Err(e) = self.mail.send(notifications::welcome_email(email, &titles)).await {
            warn!(email, error = %e, "Failed to send welcome email");
        }
    }
}

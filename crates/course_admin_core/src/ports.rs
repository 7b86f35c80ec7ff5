//! crates/course_admin_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on. These traits
//! form the boundary of the hexagonal architecture: the reconciler and the
//! services only ever see a document store, an identity service, a blob store
//! and a mail transport, never a concrete database or SMTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::AccountRole;
use crate::store::{CollectionPath, DocumentPath, Fields, StoredDocument};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

impl From<validator::ValidationErrors> for PortError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PortError::Validation(errors.to_string())
    }
}

impl From<serde_json::Error> for PortError {
    fn from(error: serde_json::Error) -> Self {
        PortError::Unexpected(format!("malformed document: {error}"))
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Path-addressed document database.
///
/// Collections nest under documents (`courses/{id}/modules/{id}/sections`).
/// Writes to a document never touch its sub-collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocumentPath) -> PortResult<Option<StoredDocument>>;

    /// Lists a collection, ascending by `order_by` when given. Documents with
    /// equal keys keep the store's natural listing order.
    async fn list(
        &self,
        collection: &CollectionPath,
        order_by: Option<&str>,
    ) -> PortResult<Vec<StoredDocument>>;

    /// Lists the documents whose top-level `field` equals `value`.
    async fn list_where(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &serde_json::Value,
    ) -> PortResult<Vec<StoredDocument>>;

    /// Creates a document under a store-assigned id and returns the id.
    async fn create(&self, collection: &CollectionPath, fields: Fields) -> PortResult<String>;

    /// Writes the full document at a caller-chosen path, replacing any
    /// previous content.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> PortResult<()>;

    /// Merges `fields` into an existing document. Fails with `NotFound` when
    /// the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> PortResult<()>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &DocumentPath) -> PortResult<()>;
}

/// An account known to the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub role: AccountRole,
}

/// Authentication and account management.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates an account and returns its id. An email that is already taken
    /// yields `Conflict`.
    async fn create_user(&self, email: &str, password: &str, role: AccountRole) -> PortResult<String>;

    async fn delete_user(&self, user_id: &str) -> PortResult<()>;

    async fn get_user(&self, user_id: &str) -> PortResult<Account>;

    /// Returns a single-use link the account owner can follow to pick a new
    /// password.
    async fn generate_password_reset_link(&self, email: &str) -> PortResult<String>;

    /// Redeems a reset token issued by `generate_password_reset_link`.
    async fn complete_password_reset(&self, token: &str, new_password: &str) -> PortResult<()>;

    /// Checks a password; `Unauthorized` on any mismatch.
    async fn verify_credentials(&self, email: &str, password: &str) -> PortResult<Account>;

    // --- Browser sessions ---
    async fn create_session(&self, user_id: &str, expires_at: DateTime<Utc>) -> PortResult<String>;

    /// Returns the account id behind a live session.
    async fn validate_session(&self, session_id: &str) -> PortResult<String>;

    async fn delete_session(&self, session_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores the bytes and returns a publicly reachable URL.
    async fn save(&self, bytes: &[u8], content_type: &str) -> PortResult<String>;
}

/// An outgoing email. `text` is the plain-text alternative of `html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: MailMessage) -> PortResult<()>;
}

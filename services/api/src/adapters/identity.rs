//! services/api/src/adapters/identity.rs
//!
//! Accounts, browser sessions and password-reset tokens, kept in the same
//! document store as the rest of the app. Passwords are hashed with Argon2.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use course_admin_core::domain::AccountRole;
use course_admin_core::ports::{Account, DocumentStore, IdentityService, PortError, PortResult};
use course_admin_core::store::{to_fields, CollectionPath, StoredDocument};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

const ACCOUNTS: &str = "authAccounts";
const SESSIONS: &str = "authSessions";
const PASSWORD_RESETS: &str = "passwordResets";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    email: String,
    password_hash: String,
    role: AccountRole,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    user_id: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetRecord {
    account_id: String,
    expires_at: DateTime<Utc>,
}

/// `IdentityService` backed by a `DocumentStore`.
pub struct DocumentIdentityService {
    store: Arc<dyn DocumentStore>,
    public_base_url: String,
    reset_ttl: Duration,
}

impl DocumentIdentityService {
    pub fn new(store: Arc<dyn DocumentStore>, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
            reset_ttl: Duration::hours(1),
        }
    }

    /// Creates the admin account unless one with this email already exists.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> PortResult<()> {
        if self.find_by_email(email).await?.is_some() {
            return Ok(());
        }
        let id = self.create_user(email, password, AccountRole::Admin).await?;
        info!(account_id = %id, "Bootstrap admin account created");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<(StoredDocument, AccountRecord)>> {
        let docs = self
            .store
            .list_where(&accounts(), "email", &json!(normalize(email)))
            .await?;
        match docs.into_iter().next() {
            Some(doc) => {
                let record = doc.decode()?;
                Ok(Some((doc, record)))
            }
            None => Ok(None),
        }
    }

    async fn drop_sessions_of(&self, account_id: &str) -> PortResult<()> {
        let open = self
            .store
            .list_where(&sessions(), "userId", &json!(account_id))
            .await?;
        for session in open {
            self.store.delete(&sessions().doc(session.id)).await?;
        }
        Ok(())
    }
}

fn accounts() -> CollectionPath {
    CollectionPath::root(ACCOUNTS)
}

fn sessions() -> CollectionPath {
    CollectionPath::root(SESSIONS)
}

fn resets() -> CollectionPath {
    CollectionPath::root(PASSWORD_RESETS)
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {e}")))
}

fn to_account(id: String, record: AccountRecord) -> Account {
    Account {
        id,
        email: record.email,
        role: record.role,
    }
}

#[async_trait]
impl IdentityService for DocumentIdentityService {
    async fn create_user(&self, email: &str, password: &str, role: AccountRole) -> PortResult<String> {
        let email = normalize(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(PortError::Conflict(format!("{email} already has an account")));
        }
        let record = AccountRecord {
            email,
            password_hash: hash_password(password)?,
            role,
            created_at: Utc::now(),
        };
        self.store.create(&accounts(), to_fields(&record)?).await
    }

    async fn delete_user(&self, user_id: &str) -> PortResult<()> {
        let path = accounts().doc(user_id);
        if self.store.get(&path).await?.is_none() {
            return Err(PortError::NotFound(format!("Account {user_id} not found")));
        }
        self.store.delete(&path).await?;
        if let Err(e) = self.drop_sessions_of(user_id).await {
            warn!(account_id = %user_id, "Failed to drop sessions of a deleted account: {:?}", e);
        }
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> PortResult<Account> {
        let doc = self
            .store
            .get(&accounts().doc(user_id))
            .await?
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        Ok(to_account(doc.id.clone(), doc.decode()?))
    }

    async fn generate_password_reset_link(&self, email: &str) -> PortResult<String> {
        let (doc, _) = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        let token = Uuid::new_v4().simple().to_string();
        let record = ResetRecord {
            account_id: doc.id,
            expires_at: Utc::now() + self.reset_ttl,
        };
        self.store.set(&resets().doc(token.clone()), to_fields(&record)?).await?;
        Ok(format!("{}/reset-password?token={}", self.public_base_url, token))
    }

    async fn complete_password_reset(&self, token: &str, new_password: &str) -> PortResult<()> {
        let path = resets().doc(token);
        let reset: ResetRecord = match self.store.get(&path).await? {
            Some(doc) => doc.decode()?,
            None => return Err(PortError::Unauthorized),
        };
        if reset.expires_at <= Utc::now() {
            self.store.delete(&path).await?;
            return Err(PortError::Unauthorized);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        let patch = to_fields(&json!({ "passwordHash": hash_password(new_password)? }))?;
        self.store.update(&accounts().doc(&reset.account_id), patch).await?;
        self.store.delete(&path).await?;
        self.drop_sessions_of(&reset.account_id).await?;
        info!(account_id = %reset.account_id, "Password reset completed");
        Ok(())
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> PortResult<Account> {
        let (doc, record) = self
            .find_by_email(email)
            .await?
            .ok_or(PortError::Unauthorized)?;
        let parsed_hash = PasswordHash::new(&record.password_hash)
            .map_err(|e| PortError::Unexpected(format!("Stored password hash is invalid: {e}")))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| PortError::Unauthorized)?;
        Ok(to_account(doc.id, record))
    }

    async fn create_session(&self, user_id: &str, expires_at: DateTime<Utc>) -> PortResult<String> {
        let session_id = Uuid::new_v4().to_string();
        let record = SessionRecord {
            user_id: user_id.to_string(),
            expires_at,
        };
        self.store
            .set(&sessions().doc(session_id.clone()), to_fields(&record)?)
            .await?;
        Ok(session_id)
    }

    async fn validate_session(&self, session_id: &str) -> PortResult<String> {
        let path = sessions().doc(session_id);
        let session: SessionRecord = match self.store.get(&path).await? {
            Some(doc) => doc.decode()?,
            None => return Err(PortError::Unauthorized),
        };
        if session.expires_at <= Utc::now() {
            self.store.delete(&path).await?;
            return Err(PortError::Unauthorized);
        }
        Ok(session.user_id)
    }

    async fn delete_session(&self, session_id: &str) -> PortResult<()> {
        self.store.delete(&sessions().doc(session_id)).await
    }
}

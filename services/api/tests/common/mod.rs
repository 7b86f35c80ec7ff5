#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tracing::Level;

use api_lib::adapters::{DocumentIdentityService, LocalBlobStorage};
use api_lib::config::{Config, StoreBackend};
use api_lib::web::{self, state::AppState};
use course_admin_core::domain::AccountRole;
use course_admin_core::ports::{IdentityService, MailMessage, MailTransport, PortResult};
use course_admin_core::InMemoryDocumentStore;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const BASE_URL: &str = "http://admin.test";

/// Build a test `Config` with safe defaults and a private media directory.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        store: StoreBackend::Memory,
        log_level: Level::INFO,
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        media_dir: std::env::temp_dir().join(format!("course-admin-test-{}", uuid::Uuid::new_v4())),
        public_base_url: BASE_URL.to_string(),
        smtp: None,
        admin: None,
        session_ttl_days: 30,
    }
}

#[derive(Default)]
pub struct RecordingMail {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMail {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMail {
    async fn send(&self, message: MailMessage) -> PortResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryDocumentStore>,
    pub identity: Arc<DocumentIdentityService>,
    pub mail: Arc<RecordingMail>,
    pub config: Arc<Config>,
}

/// Builds the production router on in-memory adapters, with one admin account.
pub async fn test_app() -> TestApp {
    let config = Arc::new(test_config());
    let store = Arc::new(InMemoryDocumentStore::new());
    let identity = Arc::new(DocumentIdentityService::new(store.clone(), BASE_URL));
    identity.ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    let mail = Arc::new(RecordingMail::default());
    let blobs = Arc::new(LocalBlobStorage::new(config.media_dir.clone(), BASE_URL));

    let state = Arc::new(AppState::new(
        config.clone(),
        store.clone(),
        identity.clone(),
        blobs,
        mail.clone(),
    ));
    TestApp {
        router: web::router(state),
        store,
        identity,
        mail,
        config,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    /// Signs in and returns the `session=...` cookie pair.
    pub async fn login_as(&self, email: &str, password: &str) -> TestResponse {
        self.call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({"email": email, "password": password})),
        )
        .await
    }

    pub async fn admin_cookie(&self) -> String {
        let response = self.login_as(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        session_pair(&response)
    }

    pub async fn student(&self, email: &str, password: &str) -> String {
        self.identity
            .create_user(email, password, AccountRole::Student)
            .await
            .unwrap()
    }
}

pub fn session_pair(response: &TestResponse) -> String {
    response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

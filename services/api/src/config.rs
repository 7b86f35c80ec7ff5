//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `DocumentStore` implementation backs the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    /// Process-local and lost on restart. Meant for development and tests.
    Memory,
}

/// Outgoing mail server. Without one, emails are only logged.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from_address: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Credentials of the admin account created at startup when it is missing.
#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store: StoreBackend,
    pub log_level: Level,
    pub cors_origin: HeaderValue,
    pub media_dir: PathBuf,
    /// Base of every absolute URL the service hands out (media, reset links).
    pub public_base_url: String,
    pub smtp: Option<SmtpConfig>,
    pub admin: Option<AdminBootstrap>,
    pub session_ttl_days: i64,
}

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@edzeeta.local";

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Storage Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let store = match std::env::var("DOCUMENT_STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres {
                database_url: std::env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "DOCUMENT_STORE".to_string(),
                    format!("'{other}' is not one of 'postgres', 'memory'"),
                ))
            }
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin_str =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origin = cors_origin_str.parse::<HeaderValue>().map_err(|e| {
            ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
        })?;

        let media_dir = std::env::var("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        // --- Load Mail and Account Settings ---
        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                from_address: std::env::var("SMTP_FROM")
                    .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
                user: std::env::var("SMTP_USER").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
            }),
            Err(_) => None,
        };

        let admin = match (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminBootstrap { email, password }),
            (Ok(_), Err(_)) => return Err(ConfigError::MissingVar("ADMIN_PASSWORD".to_string())),
            _ => None,
        };

        let session_ttl_days = session_ttl(parse_or("SESSION_TTL_DAYS", 30)?)?;

        Ok(Self {
            bind_address,
            store,
            log_level,
            cors_origin,
            media_dir,
            public_base_url,
            smtp,
            admin,
            session_ttl_days,
        })
    }
}

const SESSION_TTL_RANGE: std::ops::RangeInclusive<i64> = 1..=365;

fn session_ttl(days: i64) -> Result<i64, ConfigError> {
    if SESSION_TTL_RANGE.contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::InvalidValue(
            "SESSION_TTL_DAYS".to_string(),
            format!("{days} is outside 1..=365"),
        ))
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

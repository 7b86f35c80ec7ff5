//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DocumentIdentityService, LocalBlobStorage, LogMailer, PgDocumentStore, SmtpMailer},
    config::{Config, StoreBackend},
    error::ApiError,
    web::{self, state::AppState},
};
use course_admin_core::ports::{DocumentStore, MailTransport};
use course_admin_core::InMemoryDocumentStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Document Store & Run Migrations ---
    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = PgDocumentStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory document store; data is lost on restart");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let identity = Arc::new(DocumentIdentityService::new(
        store.clone(),
        config.public_base_url.clone(),
    ));
    if let Some(admin) = &config.admin {
        identity.ensure_admin(&admin.email, &admin.password).await?;
    }

    let mail: Arc<dyn MailTransport> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            warn!("SMTP_HOST is not set; outgoing emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let blobs = Arc::new(LocalBlobStorage::new(
        config.media_dir.clone(),
        config.public_base_url.clone(),
    ));

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(config.clone(), store, identity, blobs, mail));
    let app = web::router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

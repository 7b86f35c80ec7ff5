pub mod auth;
pub mod courses;
pub mod middleware;
pub mod projects;
pub mod rest;
pub mod state;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::require_auth;
use rest::ApiDoc;
use state::AppState;

const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Builds the full application router. The `api` binary and the HTTP tests
/// both go through here.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/password-reset", post(auth::complete_password_reset_handler));

    // Protected routes (admin session required)
    let protected_routes = Router::new()
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route("/courses/options", get(courses::course_options))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/{id}/thumbnail", post(courses::upload_thumbnail))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", axum::routing::delete(users::delete_user))
        .route("/users/{id}/courses", put(users::update_user_courses))
        .route("/users/{id}/password-reset", post(users::send_password_reset))
        .route(
            "/project-categories",
            get(projects::list_categories).post(projects::create_category),
        )
        .route(
            "/project-categories/{id}",
            get(projects::get_category)
                .put(projects::update_category)
                .delete(projects::delete_category),
        )
        .route("/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/assignments", get(projects::list_assignments))
        .route("/assignments/sync", post(projects::sync_assignments))
        .route("/submissions", get(projects::list_submissions))
        .route("/submissions/{id}/review", post(projects::review_submission))
        .route("/submissions/{id}/resubmit", post(projects::resubmit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(rest::health_handler))
        .nest("/api", api_router)
        .nest_service("/media", ServeDir::new(&state.config.media_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        // Merge the Swagger UI router for a complete application.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

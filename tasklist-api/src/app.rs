//! Application state and router builder.
//!
//! # Router layout
//!
//! ```text
//! /
//! ├── GET  /                       # welcome document (public)
//! ├── GET  /health                 # liveness probe (public)
//! ├── /uploads/*                   # stored images (public, static)
//! └── /api/
//!     ├── /auth/
//!     │   ├── POST /register       # public
//!     │   ├── POST /login          # public
//!     │   ├── GET  /me             # bearer token required
//!     │   └── PUT  /profile        # bearer token required
//!     ├── /todos/...               # bearer token required
//!     └── /user/...                # bearer token required
//! ```
//!
//! Middleware, outermost first: body-size limit, security headers, CORS,
//! request tracing; the bearer-token gate wraps the protected groups
//! individually. All of it is configured from the [`Config`] passed into
//! [`build_router`]: nothing reads ambient state.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tasklist_shared::{
    auth::jwt::{self, JwtError},
    upload::{UploadStore, MAX_IMAGE_BYTES},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

use crate::{config::Config, middleware, routes};

/// Multipart bodies carry boundary overhead on top of the file itself;
/// the HTTP-level cap leaves room for it so the upload module's own
/// 5 MB check is the one that fires.
const BODY_LIMIT_BYTES: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Shared application state, cloned per request handler.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Upload storage rooted at the configured upload directory
    pub uploads: UploadStore,
}

impl AppState {
    /// Creates new application state.
    pub fn new(db: PgPool, config: Config) -> Self {
        let uploads = UploadStore::new(config.upload.dir.clone());
        Self {
            db,
            config: Arc::new(config),
            uploads,
        }
    }

    /// The token signing secret.
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Issues a bearer token for a user with the configured lifetime.
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        let claims = jwt::Claims::new(
            user_id,
            chrono::Duration::hours(self.config.jwt.expiration_hours),
        );
        jwt::create_token(&claims, self.jwt_secret())
    }
}

/// Builds the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let auth_protected = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/profile", put(routes::auth::update_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let todo_routes = Router::new()
        .route("/", get(routes::todos::list_todos).post(routes::todos::create_todo))
        .route("/stats", get(routes::todos::todo_stats))
        .route(
            "/:id",
            get(routes::todos::get_todo)
                .put(routes::todos::update_todo)
                .delete(routes::todos::delete_todo),
        )
        .route("/:id/complete", patch(routes::todos::mark_completed))
        .route("/:id/pending", patch(routes::todos::mark_pending))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let user_routes = Router::new()
        .route(
            "/profile",
            get(routes::user::get_profile).put(routes::user::update_profile),
        )
        .route("/profile-image", put(routes::user::update_profile_image))
        .route("/change-password", put(routes::user::change_password))
        .route("/stats", get(routes::user::user_stats))
        .route("/account", delete(routes::user::delete_account))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/todos", todo_routes)
        .nest("/user", user_routes);

    let cors = build_cors(&state.config);
    let production = state.config.api.production;

    Router::new()
        .route("/", get(routes::health::welcome))
        .route("/health", get(routes::health::health_check))
        .nest_service("/uploads", ServeDir::new(&state.config.upload.dir))
        .nest("/api", api_routes)
        .fallback(routes::health::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(move |req, next| {
            middleware::security::apply(production, req, next)
        }))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}

/// CORS from configuration: fully permissive when the origin list
/// contains `*`, otherwise an explicit allow-list with credentials.
fn build_cors(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    }
}

//! # Tasklist API Server
//!
//! HTTP server for authenticated per-user task lists: registration and
//! login, profile management with image upload, and todo CRUD with
//! filtering, sorting, pagination, and statistics.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/tasklist \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p tasklist-api
//! ```

use tasklist_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasklist_shared::db::{migrations, pool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasklist_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tasklist API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    let state = AppState::new(db, config.clone());
    state.uploads.ensure_dirs().await?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Server listening on http://{}", config.bind_address());

    axum::serve(listener, app).await?;

    Ok(())
}

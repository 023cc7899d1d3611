pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::SqliteRepository;
use crate::error::ApiError;
use crate::services::sessions::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Mutex<SqliteRepository>>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(repository: SqliteRepository) -> Self {
        Self::with_sessions(repository, SessionStore::new())
    }

    /// State whose matching sessions expire after `idle_timeout` without use.
    pub fn with_idle_timeout(repository: SqliteRepository, idle_timeout: Duration) -> Self {
        Self::with_sessions(repository, SessionStore::with_idle_timeout(idle_timeout))
    }

    fn with_sessions(repository: SqliteRepository, sessions: SessionStore) -> Self {
        Self {
            repository: Arc::new(Mutex::new(repository)),
            sessions: Arc::new(sessions),
        }
    }

    /// Run `f` against the repository on the blocking thread pool.
    ///
    /// SQLite calls block, so request handlers go through here instead of
    /// locking the repository on an async worker.
    pub async fn with_repo<T, F>(&self, f: F) -> error::Result<T>
    where
        F: FnOnce(&SqliteRepository) -> error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || {
            let repo = lock_repository(&repository)?;
            f(&repo)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("repository task failed: {e}")))?
    }
}

fn lock_repository(
    repository: &Mutex<SqliteRepository>,
) -> error::Result<MutexGuard<'_, SqliteRepository>> {
    repository
        .lock()
        .map_err(|_| ApiError::Internal("repository lock poisoned".into()))
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Deck routes
        .route("/api/decks", get(routes::decks::list))
        .route("/api/decks/{path}/note-types", get(routes::decks::note_types))
        .route("/api/decks/{path}/import", post(routes::notes::import))
        // Note type routes
        .route(
            "/api/note-types",
            get(routes::note_types::list).post(routes::note_types::create),
        )
        .route("/api/note-types/{id}/fields", get(routes::note_types::fields))
        // Card routes
        .route("/api/cards/{id}/state", get(routes::cards::get_state))
        // Settings routes
        .route("/api/settings", get(routes::settings::get_all))
        .route("/api/settings/global", put(routes::settings::update_global))
        .route(
            "/api/settings/deck/{path}",
            put(routes::settings::update_deck).delete(routes::settings::delete_deck),
        )
        // Matching session routes
        .route("/api/matches", post(routes::matches::start))
        .route(
            "/api/matches/{id}",
            get(routes::matches::get).delete(routes::matches::end),
        )
        .route(
            "/api/matches/{id}/vocab/{tile}",
            post(routes::matches::select_vocab),
        )
        .route(
            "/api/matches/{id}/meaning/{tile}",
            post(routes::matches::select_meaning),
        )
        .route("/api/matches/{id}/next", post(routes::matches::next_page))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Opening database at {}...", config.database_path.display());
    let repository = SqliteRepository::open(&config.database_path)?;

    let app = router(AppState::with_idle_timeout(
        repository,
        config.session_idle_timeout,
    ));

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

//! Application state, router and server.
//!
//! [`SnippetboxApp`] ties settings, the template cache and the stores into
//! an axum [`Router`] and serves it.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use snippetbox_core::Settings;
//! use snippetbox_template::TemplateCache;
//! use snippetbox_views::server::SnippetboxApp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let templates = TemplateCache::from_dir(&settings.template_dir)?;
//! let app = SnippetboxApp::new(settings, Arc::new(templates));
//! app.run().await?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use snippetbox_core::{CoreError, Settings};
use snippetbox_template::TemplateCache;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::models::{InMemorySnippetStore, InMemoryUserStore, SnippetStore, UserStore};
use crate::session::{session_middleware, InMemorySessionStore, SessionManager};

/// How often the running server drops expired sessions.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Composed pages, built once at startup.
    pub templates: Arc<TemplateCache>,
    /// Snippet storage.
    pub snippets: Arc<dyn SnippetStore>,
    /// User storage.
    pub users: Arc<dyn UserStore>,
    /// Session store and cookie settings.
    pub sessions: SessionManager,
}

impl AppState {
    /// State backed by in-memory stores configured from `settings`.
    pub fn in_memory(settings: &Settings, templates: Arc<TemplateCache>) -> Self {
        let store = Arc::new(InMemorySessionStore::new(settings.session_lifetime_secs));
        Self {
            templates,
            snippets: Arc::new(InMemorySnippetStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            sessions: SessionManager::new(
                store,
                &settings.session_cookie_name,
                settings.session_lifetime_secs,
            )
            .with_cookie_secure(settings.session_cookie_secure),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("pages", &self.templates.page_names())
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

/// Builds the application router.
///
/// Routes:
///
/// | method | path | handler |
/// |---|---|---|
/// | GET | `/` | [`handlers::home`] |
/// | GET | `/snippet/view/{id}` | [`handlers::snippet_view`] |
/// | GET, POST | `/snippet/create` | [`handlers::snippet_create`], [`handlers::snippet_create_post`] |
/// | GET, POST | `/user/signup` | [`handlers::user_signup`], [`handlers::user_signup_post`] |
/// | GET | `/static/*` | files under `static_dir` |
pub fn router(state: AppState, static_dir: impl Into<PathBuf>) -> Router {
    let sessions = state.sessions.clone();
    Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/{id}", get(handlers::snippet_view))
        .route(
            "/snippet/create",
            get(handlers::snippet_create).post(handlers::snippet_create_post),
        )
        .route(
            "/user/signup",
            get(handlers::user_signup).post(handlers::user_signup_post),
        )
        .fallback(handlers::fallback)
        .layer(axum::middleware::from_fn_with_state(
            sessions,
            session_middleware,
        ))
        .nest_service("/static", ServeDir::new(static_dir.into()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The snippetbox web application.
pub struct SnippetboxApp {
    settings: Settings,
    state: AppState,
}

impl SnippetboxApp {
    /// Creates an application with in-memory stores.
    pub fn new(settings: Settings, templates: Arc<TemplateCache>) -> Self {
        let state = AppState::in_memory(&settings, templates);
        Self { settings, state }
    }

    /// Creates an application around existing state.
    pub fn with_state(settings: Settings, state: AppState) -> Self {
        Self { settings, state }
    }

    /// Returns the application settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Converts the application into an axum router.
    pub fn into_router(self) -> Router {
        router(self.state, self.settings.static_dir)
    }

    /// Binds the configured address and serves until the process stops.
    ///
    /// Expired sessions are swept out every [`SESSION_SWEEP_INTERVAL`] while
    /// the server runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn run(self) -> Result<(), CoreError> {
        let addr = self.settings.addr.clone();
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            CoreError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;
        tracing::info!(%addr, "starting server");
        let sweep = self.state.sessions.spawn_expiry_sweep(SESSION_SWEEP_INTERVAL);
        let served = axum::serve(listener, self.into_router()).await;
        sweep.abort();
        served?;
        Ok(())
    }
}

impl std::fmt::Debug for SnippetboxApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetboxApp")
            .field("addr", &self.settings.addr)
            .field("debug", &self.settings.debug)
            .field("state", &self.state)
            .finish()
    }
}

//! Sessions and flash messages.
//!
//! This module provides the [`SessionStore`] trait, an in-memory
//! implementation, and the cookie middleware that attaches a [`SessionKey`]
//! to every request.
//!
//! Flash messages are plain session strings that are read exactly once:
//! [`SessionStore::pop_string`] removes the value in the same critical
//! section that reads it, so concurrent requests sharing a session can never
//! both observe the same flash.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::SessionError;

/// Data associated with one session.
#[derive(Debug, Clone)]
pub struct SessionData {
    /// The key identifying this session, carried in the session cookie.
    pub session_key: String,
    /// Session values.
    pub data: HashMap<String, serde_json::Value>,
    /// When this session stops being valid.
    pub expire_date: DateTime<Utc>,
}

impl SessionData {
    /// Creates an empty session that lives for `lifetime`.
    pub fn new(session_key: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            session_key: session_key.into(),
            data: HashMap::new(),
            expire_date: Utc::now() + lifetime,
        }
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Sets a value.
    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Removes a value, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Returns `true` if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expire_date
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A backend for storing and retrieving session data.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session.
    async fn load(&self, session_key: &str) -> Result<SessionData, SessionError>;

    /// Saves a session, replacing any previous data under its key.
    async fn save(&self, session: &SessionData) -> Result<(), SessionError>;

    /// Deletes a session.
    async fn delete(&self, session_key: &str) -> Result<(), SessionError>;

    /// Checks whether a live session exists under this key.
    async fn exists(&self, session_key: &str) -> Result<bool, SessionError>;

    /// Stores a string value, creating the session if needed.
    async fn put_string(
        &self,
        session_key: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError>;

    /// Reads and removes a string value in one step.
    ///
    /// Returns `None` if the session, the key, or a string value under the
    /// key is missing. A value put once is returned by at most one call.
    async fn pop_string(&self, session_key: &str, key: &str) -> Option<String>;

    /// Removes all expired sessions.
    async fn clear_expired(&self) -> Result<(), SessionError>;
}

/// An in-memory session store. Sessions are lost on restart.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    lifetime: Duration,
}

impl InMemorySessionStore {
    /// Creates a store whose new sessions live for `lifetime_secs` seconds.
    pub fn new(lifetime_secs: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lifetime: Duration::seconds(lifetime_secs),
        }
    }

    /// The lifetime given to new sessions.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(12 * 60 * 60)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_key: &str) -> Result<SessionData, SessionError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_key)
            .filter(|s| !s.is_expired())
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_key.to_string()))
    }

    async fn save(&self, session: &SessionData) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(session.session_key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_key: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(session_key);
        Ok(())
    }

    async fn exists(&self, session_key: &str) -> Result<bool, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_key).is_some_and(|s| !s.is_expired()))
    }

    async fn put_string(
        &self,
        session_key: &str,
        key: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(session_key.to_string())
            .or_insert_with(|| SessionData::new(session_key, self.lifetime));
        if session.is_expired() {
            *session = SessionData::new(session_key, self.lifetime);
        }
        session.set(key, serde_json::Value::String(value.to_string()));
        Ok(())
    }

    async fn pop_string(&self, session_key: &str, key: &str) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_key)?;
        if session.is_expired() || !session.get(key).is_some_and(serde_json::Value::is_string) {
            return None;
        }
        match session.remove(key) {
            Some(serde_json::Value::String(value)) => Some(value),
            _ => None,
        }
    }

    async fn clear_expired(&self) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .retain(|_, session| !session.is_expired());
        Ok(())
    }
}

/// The session key of the current request, inserted by
/// [`session_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub String);

/// Session store plus cookie settings, shared by the middleware and handlers.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    cookie_path: String,
    cookie_secure: bool,
    max_age_secs: i64,
}

impl SessionManager {
    /// Creates a manager issuing cookies named `cookie_name` that live for
    /// `max_age_secs`.
    pub fn new(store: Arc<dyn SessionStore>, cookie_name: &str, max_age_secs: i64) -> Self {
        Self {
            store,
            cookie_name: cookie_name.to_string(),
            cookie_path: "/".to_string(),
            cookie_secure: false,
            max_age_secs,
        }
    }

    /// Sets whether the cookie should be marked as secure.
    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn SessionStore {
        &*self.store
    }

    /// Spawns a task that removes expired sessions every `period`, starting
    /// immediately. Abort the returned handle to stop it.
    pub fn spawn_expiry_sweep(&self, period: std::time::Duration) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let period = period.max(std::time::Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = store.clear_expired().await {
                    tracing::warn!(error = %e, "failed to clear expired sessions");
                }
            }
        })
    }

    /// Returns `true` if a live session exists under `key`. A store failure
    /// is logged and treated as no session.
    pub async fn session_exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed");
                false
            }
        }
    }

    /// The session cookie name.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Extracts the session key from the request's `Cookie` headers.
    pub fn session_key_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let prefix = format!("{}=", self.cookie_name);
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|header| header.split(';'))
            .find_map(|cookie| cookie.trim().strip_prefix(&prefix).map(str::to_string))
            .filter(|key| !key.is_empty())
    }

    /// Builds the `Set-Cookie` header value for a session key.
    pub fn build_set_cookie(&self, session_key: &str) -> String {
        use std::fmt::Write;
        let mut cookie = format!("{}={}", self.cookie_name, session_key);
        let _ = write!(cookie, "; Path={}", self.cookie_path);
        let _ = write!(cookie, "; Max-Age={}", self.max_age_secs);
        cookie.push_str("; HttpOnly");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_path", &self.cookie_path)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

/// Attaches a [`SessionKey`] to the request and sets the session cookie on
/// the response once the session holds data.
///
/// A missing, unknown or expired cookie gets a fresh key; the old key is
/// never reused.
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = match manager.session_key_from_headers(request.headers()) {
        Some(key) if manager.session_exists(&key).await => key,
        _ => generate_session_key(),
    };
    request.extensions_mut().insert(SessionKey(key.clone()));

    let mut response = next.run(request).await;

    if manager.session_exists(&key).await {
        if let Ok(value) = HeaderValue::from_str(&manager.build_set_cookie(&key)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Generates a random session key.
pub fn generate_session_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

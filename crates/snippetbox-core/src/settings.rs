//! Process settings.
//!
//! [`Settings`] holds everything the server needs before it starts accepting
//! requests. Every field has a default, so a TOML file only has to name the
//! values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The complete set of process settings.
///
/// # Examples
///
/// ```
/// use snippetbox_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.addr, "127.0.0.1:4000");
/// assert_eq!(settings.session_cookie_name, "session");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The socket address the server listens on.
    pub addr: String,
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The tracing filter directive (e.g. "info", "snippetbox=debug").
    pub log_level: String,
    /// Directory holding `base.html`, `partials/` and `pages/`.
    pub template_dir: PathBuf,
    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
    /// Name of the cookie carrying the session key.
    pub session_cookie_name: String,
    /// Session lifetime in seconds.
    pub session_lifetime_secs: i64,
    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:4000".to_string(),
            debug: false,
            log_level: "info".to_string(),
            template_dir: PathBuf::from("./ui/html"),
            static_dir: PathBuf::from("./ui/static"),
            session_cookie_name: "session".to_string(),
            session_lifetime_secs: 12 * 60 * 60,
            session_cookie_secure: false,
        }
    }
}

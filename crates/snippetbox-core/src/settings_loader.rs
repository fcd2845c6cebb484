//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `SNIPPETBOX_ADDR` | `addr` |
//! | `SNIPPETBOX_DEBUG` | `debug` |
//! | `SNIPPETBOX_LOG_LEVEL` | `log_level` |
//! | `SNIPPETBOX_TEMPLATE_DIR` | `template_dir` |
//! | `SNIPPETBOX_STATIC_DIR` | `static_dir` |
//! | `SNIPPETBOX_SESSION_COOKIE_SECURE` | `session_cookie_secure` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use snippetbox_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("snippetbox.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::settings::Settings;

/// Loads settings from a TOML string. Missing keys keep their defaults.
///
/// # Errors
///
/// Returns [`CoreError::ImproperlyConfigured`] if the TOML is malformed or a
/// value has the wrong type.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, CoreError> {
    toml::from_str(toml_str)
        .map_err(|e| CoreError::ImproperlyConfigured(format!("Failed to parse TOML: {e}")))
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, CoreError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        CoreError::ImproperlyConfigured(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, CoreError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `SNIPPETBOX_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Applies overrides from an arbitrary lookup. Split out so tests do not
/// have to mutate the process environment.
fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("SNIPPETBOX_ADDR") {
        settings.addr = val;
    }

    if let Some(val) = lookup("SNIPPETBOX_DEBUG") {
        settings.debug = is_truthy(&val);
    }

    if let Some(val) = lookup("SNIPPETBOX_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("SNIPPETBOX_TEMPLATE_DIR") {
        settings.template_dir = PathBuf::from(val);
    }

    if let Some(val) = lookup("SNIPPETBOX_STATIC_DIR") {
        settings.static_dir = PathBuf::from(val);
    }

    if let Some(val) = lookup("SNIPPETBOX_SESSION_COOKIE_SECURE") {
        settings.session_cookie_secure = is_truthy(&val);
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

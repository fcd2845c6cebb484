//! Core error types.
//!
//! [`CoreError`] covers failures that happen before any request is served:
//! reading configuration files and parsing them. Request-time failures have
//! their own error types in the crates that produce them (decode errors in
//! `snippetbox-forms`, render errors in `snippetbox-template`).

use thiserror::Error;

/// Errors raised while setting the process up.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration file could not be parsed or holds invalid values.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// An IO error while reading configuration or assets.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

//! # snippetbox-core
//!
//! Core types, settings, and error types shared by every snippetbox crate.
//! This crate has no framework dependencies of its own.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Process settings with defaults
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

pub use error::{CoreError, CoreResult};
pub use settings::Settings;

//! # snippetbox-template
//!
//! HTML template composition for snippetbox. A small Django-flavoured
//! template language (variables with filters, `if`, `for`, `with`,
//! `block`, `include`, `autoescape`) plus a [`TemplateCache`] that composes
//! every page once, at startup, from a base layout, shared partials and the
//! page itself.
//!
//! Rendering is two-phase: a page is executed into a buffer first, and only
//! a complete success reaches the [`ResponseSink`]. A failed render leaves the
//! response untouched so the caller can still send a clean error page.
//!
//! ## Modules
//!
//! - [`cache`] - Page composition and the render entry point
//! - [`context`] - Render context and dynamic values
//! - [`error`] - Template, build and render errors
//! - [`filters`] - Built-in filters
//! - [`lexer`] - Tokenizer
//! - [`parser`] - Node tree and expressions
//! - [`render`] - Node execution and response sinks

pub mod cache;
pub mod context;
pub mod error;
pub mod filters;
pub mod lexer;
pub mod parser;
pub mod render;

pub use cache::{TemplateCache, TemplateSource, TemplateUnit};
pub use context::{Context, ContextValue};
pub use error::{BuildError, RenderError, TemplateError};
pub use filters::human_date;
pub use render::{BufferedSink, ResponseSink};

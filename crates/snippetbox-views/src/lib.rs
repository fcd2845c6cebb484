//! # snippetbox-views
//!
//! The web layer of snippetbox: request handlers, the forms they bind, the
//! per-request [`ViewData`](view_data::ViewData), sessions with one-shot
//! flash messages, and the snippet and user stores.
//!
//! ## Modules
//!
//! - [`error`] - Store and session errors
//! - [`forms`] - Create-snippet and signup forms
//! - [`handlers`] - Request handlers
//! - [`helpers`] - Error responses and template rendering into responses
//! - [`models`] - Snippet and user records and their stores
//! - [`server`] - Application state, router and server
//! - [`session`] - Session stores and cookie middleware
//! - [`view_data`] - Data handed to page templates

pub mod error;
pub mod forms;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod server;
pub mod session;
pub mod view_data;

pub use error::{SessionError, StoreError};
pub use server::{router, AppState, SnippetboxApp};
pub use session::{InMemorySessionStore, SessionKey, SessionManager, SessionStore};
pub use view_data::ViewData;

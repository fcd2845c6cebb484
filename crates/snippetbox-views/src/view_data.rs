//! Per-request data handed to page templates.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::models::Snippet;
use crate::session::SessionStore;

/// The session key flash messages are stored under.
pub const FLASH_KEY: &str = "flash";

/// Everything a page template can read.
///
/// Built fresh for each request. Construction pops the session's flash
/// message, so a flash is shown on exactly one page.
#[derive(Debug, Clone, Serialize)]
pub struct ViewData {
    /// The bound form, if the page has one.
    pub form: serde_json::Value,
    /// Snippets listed on the home page, newest first.
    pub snippets: Vec<Snippet>,
    /// The snippet shown on the view page.
    pub snippet: Option<Snippet>,
    /// The flash message popped for this request, or empty.
    pub flash: String,
    /// Whether a flash message was pending.
    pub has_flash: bool,
    /// The current year in UTC, for the footer.
    pub current_year: i32,
}

impl ViewData {
    /// Creates view data for the current request, consuming any pending
    /// flash message.
    pub async fn new(sessions: &dyn SessionStore, session_key: &str) -> Self {
        let flash = sessions.pop_string(session_key, FLASH_KEY).await;
        Self {
            form: serde_json::Value::Null,
            snippets: Vec::new(),
            snippet: None,
            has_flash: flash.is_some(),
            flash: flash.unwrap_or_default(),
            current_year: Utc::now().year(),
        }
    }

    /// Attaches a form. Forms that fail to serialize are shown as empty.
    #[must_use]
    pub fn with_form<F: Serialize>(mut self, form: &F) -> Self {
        self.form = serde_json::to_value(form).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize form for template");
            serde_json::Value::Null
        });
        self
    }

    #[must_use]
    pub fn with_snippets(mut self, snippets: Vec<Snippet>) -> Self {
        self.snippets = snippets;
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.snippet = Some(snippet);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;

    #[tokio::test]
    async fn test_new_without_flash() {
        let store = InMemorySessionStore::default();
        let data = ViewData::new(&store, "s1").await;
        assert!(!data.has_flash);
        assert_eq!(data.flash, "");
        assert_eq!(data.current_year, Utc::now().year());
        assert!(data.form.is_null());
    }

    #[tokio::test]
    async fn test_new_pops_flash_once() {
        let store = InMemorySessionStore::default();
        store
            .put_string("s1", FLASH_KEY, "Your signup was successful.")
            .await
            .unwrap();

        let first = ViewData::new(&store, "s1").await;
        assert!(first.has_flash);
        assert_eq!(first.flash, "Your signup was successful.");

        let second = ViewData::new(&store, "s1").await;
        assert!(!second.has_flash);
    }

    #[tokio::test]
    async fn test_with_form_serializes() {
        let store = InMemorySessionStore::default();
        let form = crate::forms::SnippetCreateForm::default();
        let data = ViewData::new(&store, "s1").await.with_form(&form);
        assert_eq!(data.form["expired"], 1);
        assert_eq!(data.form["title"], "");
    }
}

//! Error types for template parsing, cache building and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// A fault inside a single template: malformed syntax at parse time, or a
/// failed lookup or filter call while executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template source is malformed.
    #[error("Template syntax error: {0}")]
    Syntax(String),

    /// A top-level variable is not present in the context.
    #[error("Unknown variable: '{0}'")]
    UnknownVariable(String),

    /// A filter name is not registered.
    #[error("Unknown filter: '{0}'")]
    UnknownFilter(String),

    /// A filter received an argument or value it cannot handle.
    #[error("Filter '{filter}': {message}")]
    FilterArgument {
        /// The filter name.
        filter: String,
        /// What was wrong.
        message: String,
    },

    /// A `{% for %}` loop was given something other than a list or dict.
    #[error("'{0}' is not iterable")]
    NotIterable(String),

    /// The render data could not be turned into a context.
    #[error("Invalid context data: {0}")]
    Context(String),

    /// Blocks or includes refer to each other too deeply.
    #[error("Maximum nesting depth of {0} exceeded")]
    RecursionLimit(usize),
}

impl TemplateError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub(crate) fn filter_arg(filter: &str, message: impl Into<String>) -> Self {
        Self::FilterArgument {
            filter: filter.to_string(),
            message: message.into(),
        }
    }
}

/// A failure while composing the template cache.
///
/// Every variant is fatal: the server must not start with a partial cache.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No base layout was found.
    #[error("Base layout '{0}' is missing")]
    MissingBase(PathBuf),

    /// Two pages resolve to the same base file name.
    #[error("Duplicate page name '{0}'")]
    DuplicatePage(String),

    /// Two partials resolve to the same base file name.
    #[error("Duplicate partial name '{0}'")]
    DuplicatePartial(String),

    /// Two partials fill the same slot.
    #[error("Block '{block}' is defined by both '{first}' and '{second}'")]
    DuplicateSlot {
        /// The slot name.
        block: String,
        /// The partial seen first.
        first: String,
        /// The partial seen second.
        second: String,
    },

    /// A template includes a partial that does not exist.
    #[error("'{template}' includes unknown partial '{partial}'")]
    UnknownPartial {
        /// The including template.
        template: String,
        /// The missing partial name.
        partial: String,
    },

    /// A template calls a filter that is not registered.
    #[error("'{template}' uses unknown filter '{filter}'")]
    UnknownFilter {
        /// The calling template.
        template: String,
        /// The unregistered filter name.
        filter: String,
    },

    /// A template failed to parse.
    #[error("In '{name}': {source}")]
    Syntax {
        /// The template name.
        name: String,
        /// The syntax error.
        #[source]
        source: TemplateError,
    },

    /// A template file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A failure while rendering a page. Nothing has been written to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The page is not in the cache.
    #[error("The template {0} does not exist")]
    NotFound(String),

    /// Executing the page failed.
    #[error("Failed to render '{page}': {source}")]
    Execution {
        /// The page name.
        page: String,
        /// The execution fault.
        #[source]
        source: TemplateError,
    },
}

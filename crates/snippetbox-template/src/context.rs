//! Template context for variable resolution and rendering.
//!
//! Provides [`Context`] for holding template variables in a stack-based scope,
//! and [`ContextValue`] for representing dynamic template values.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;

use crate::error::TemplateError;

/// A dynamic value in a template context.
#[derive(Debug, Clone)]
pub enum ContextValue {
    /// A string value, escaped on output when auto-escaping is on.
    String(String),
    /// A 64-bit integer.
    Integer(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// An ordered list of values.
    List(Vec<ContextValue>),
    /// A key-value mapping, iterated in key order.
    Dict(BTreeMap<String, ContextValue>),
    /// The absence of a value.
    None,
    /// A string marked as safe: auto-escaping will not be applied.
    SafeString(String),
}

impl ContextValue {
    /// Returns `true` if this value counts as true in `{% if %}`.
    ///
    /// `None`, `false`, zero, and empty strings, lists and dicts are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) | Self::SafeString(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Dict(d) => !d.is_empty(),
        }
    }

    /// Converts this value to a display string (without HTML escaping).
    pub fn to_display_string(&self) -> String {
        match self {
            Self::String(s) | Self::SafeString(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::List(items) => {
                let inner: Vec<String> = items.iter().map(Self::to_display_string).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Dict(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_display_string()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Self::None => String::new(),
        }
    }

    /// Returns `true` if this value is a safe string.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::SafeString(_))
    }

    /// Marks a string value as safe, bypassing auto-escaping.
    #[must_use]
    pub fn mark_safe(self) -> Self {
        match self {
            Self::String(s) => Self::SafeString(s),
            other => other,
        }
    }

    /// Resolves one path segment: a dict key or a list index.
    pub fn resolve_path(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(map) => map.get(key),
            Self::List(list) => key.parse::<usize>().ok().and_then(|idx| list.get(idx)),
            _ => None,
        }
    }

    /// Returns the length of a string (in characters), list or dict.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::String(s) | Self::SafeString(s) => Some(s.chars().count()),
            Self::List(l) => Some(l.len()),
            Self::Dict(d) => Some(d.len()),
            _ => None,
        }
    }

    /// Returns `true` if this is an empty collection or empty string.
    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|l| l == 0)
    }

    /// Attempts to convert this value to an i64.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::String(s) | Self::SafeString(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Attempts to convert this value to an f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the string contents if this is a String or SafeString.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::SafeString(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl PartialEq for ContextValue {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a) | Self::SafeString(a), Self::String(b) | Self::SafeString(b)) => {
                a == b
            }
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                (*a as f64) == *b
            }
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::None, Self::None) => true,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ContextValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ContextValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::None),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(arr) => Self::List(arr.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(map) => {
                Self::Dict(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// A template context that holds variables in a stack of scopes.
///
/// `{% for %}` and `{% with %}` push a scope for their bodies. Lookup
/// searches from the top of the stack downward.
///
/// # Examples
///
/// ```
/// use snippetbox_template::context::{Context, ContextValue};
///
/// let mut ctx = Context::new();
/// ctx.set("name", ContextValue::from("snippetbox"));
///
/// ctx.push();
/// ctx.set("name", ContextValue::from("inner"));
/// assert_eq!(ctx.get("name").unwrap().unwrap().to_display_string(), "inner");
///
/// ctx.pop();
/// assert_eq!(ctx.get("name").unwrap().unwrap().to_display_string(), "snippetbox");
/// ```
pub struct Context {
    stack: Vec<HashMap<String, ContextValue>>,
    auto_escape: bool,
}

impl Context {
    /// Creates a new empty context with a single scope.
    pub fn new() -> Self {
        Self {
            stack: vec![HashMap::new()],
            auto_escape: true,
        }
    }

    /// Builds a context from any value that serializes to a map.
    ///
    /// Every top-level key becomes a variable.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Context`] if serialization fails or the data
    /// is not a map.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, TemplateError> {
        let value =
            serde_json::to_value(data).map_err(|e| TemplateError::Context(e.to_string()))?;
        match ContextValue::from(value) {
            ContextValue::Dict(map) => {
                let mut ctx = Self::new();
                for (k, v) in map {
                    ctx.set(k, v);
                }
                Ok(ctx)
            }
            ContextValue::None => Ok(Self::new()),
            _ => Err(TemplateError::Context(
                "render data must serialize to a map".to_string(),
            )),
        }
    }

    /// Pushes a new scope onto the context stack.
    pub fn push(&mut self) {
        self.stack.push(HashMap::new());
    }

    /// Pops the top scope. The root scope is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Sets a variable in the current (top) scope.
    pub fn set(&mut self, key: impl Into<String>, value: ContextValue) {
        if let Some(top) = self.stack.last_mut() {
            top.insert(key.into(), value);
        }
    }

    /// Looks up a dot-separated path like `snippet.title` or `snippets.0.id`.
    ///
    /// The first segment must name a variable in some scope. Later segments
    /// that do not resolve yield `Ok(None)`, which renders as empty.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownVariable`] if the first segment is not
    /// defined in any scope.
    pub fn get(&self, path: &str) -> Result<Option<&ContextValue>, TemplateError> {
        let mut parts = path.split('.');
        let root_key = parts.next().unwrap_or_default();

        let root = self
            .stack
            .iter()
            .rev()
            .find_map(|scope| scope.get(root_key))
            .ok_or_else(|| TemplateError::UnknownVariable(root_key.to_string()))?;

        let mut current = root;
        for part in parts {
            match current.resolve_path(part) {
                Some(v) => current = v,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Returns whether auto-escaping is enabled.
    pub fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    /// Sets whether auto-escaping is enabled.
    pub fn set_auto_escape(&mut self, enabled: bool) {
        self.auto_escape = enabled;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with their HTML entity equivalents.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!ContextValue::None.is_truthy());
        assert!(!ContextValue::from("").is_truthy());
        assert!(ContextValue::from("x").is_truthy());
        assert!(!ContextValue::Integer(0).is_truthy());
        assert!(!ContextValue::List(vec![]).is_truthy());
        assert!(ContextValue::Bool(true).is_truthy());
    }

    #[test]
    fn test_from_json_object() {
        let json = serde_json::json!({"id": 3, "title": "Hi", "tags": ["a"], "gone": null});
        let value = ContextValue::from(json);
        assert_eq!(value.resolve_path("id"), Some(&ContextValue::Integer(3)));
        assert_eq!(value.resolve_path("gone"), Some(&ContextValue::None));
        assert_eq!(
            value.resolve_path("tags").and_then(|t| t.resolve_path("0")),
            Some(&ContextValue::from("a"))
        );
    }

    #[test]
    fn test_string_equality_ignores_safeness() {
        assert_eq!(
            ContextValue::from("a"),
            ContextValue::SafeString("a".to_string())
        );
        assert_eq!(ContextValue::Integer(2), ContextValue::Float(2.0));
        assert_ne!(ContextValue::Integer(2), ContextValue::from("2"));
    }

    #[test]
    fn test_unknown_root_is_error() {
        let ctx = Context::new();
        assert_eq!(
            ctx.get("missing.title").unwrap_err(),
            TemplateError::UnknownVariable("missing".into())
        );
    }

    #[test]
    fn test_unknown_nested_is_none() {
        let mut ctx = Context::new();
        ctx.set("snippet", ContextValue::from(serde_json::json!({"title": "x"})));
        assert!(ctx.get("snippet.content").unwrap().is_none());
        assert_eq!(
            ctx.get("snippet.title").unwrap(),
            Some(&ContextValue::from("x"))
        );
    }

    #[test]
    fn test_scopes_shadow_and_restore() {
        let mut ctx = Context::new();
        ctx.set("x", ContextValue::Integer(1));
        ctx.push();
        ctx.set("x", ContextValue::Integer(2));
        assert_eq!(ctx.get("x").unwrap(), Some(&ContextValue::Integer(2)));
        ctx.pop();
        ctx.pop();
        assert_eq!(ctx.get("x").unwrap(), Some(&ContextValue::Integer(1)));
    }

    #[test]
    fn test_from_serialize_requires_map() {
        assert!(Context::from_serialize(&vec![1, 2]).is_err());
        let ctx = Context::from_serialize(&serde_json::json!({"year": 2026})).unwrap();
        assert_eq!(ctx.get("year").unwrap(), Some(&ContextValue::Integer(2026)));
        assert!(Context::from_serialize(&()).is_ok());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }
}

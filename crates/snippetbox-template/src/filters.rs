//! Built-in template filters.
//!
//! Each filter is a type implementing [`Filter`], registered by name in a
//! [`FilterRegistry`]. The default registry is built once and shared.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use crate::context::{escape_html, ContextValue};
use crate::error::TemplateError;

/// A template filter function.
///
/// Takes a value and optional arguments, and returns a transformed value.
pub trait Filter: Send + Sync {
    /// Returns the filter name.
    fn name(&self) -> &'static str;

    /// Applies the filter to a value with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::FilterArgument`] when the value or arguments
    /// are unusable.
    fn apply(&self, value: &ContextValue, args: &[ContextValue])
        -> Result<ContextValue, TemplateError>;
}

/// A registry of available template filters.
pub struct FilterRegistry {
    filters: HashMap<&'static str, Box<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates a new empty filter registry.
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Registers a filter, replacing any filter with the same name.
    pub fn register(&mut self, filter: Box<dyn Filter>) {
        self.filters.insert(filter.name(), filter);
    }

    /// Returns `true` if a filter with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Applies a named filter to a value.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownFilter`] for unregistered names, or
    /// whatever the filter itself reports.
    pub fn apply(
        &self,
        name: &str,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| TemplateError::UnknownFilter(name.to_string()))?;
        filter.apply(value, args)
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the default filter registry with all built-in filters.
pub fn default_registry() -> &'static FilterRegistry {
    static REGISTRY: OnceLock<FilterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut r = FilterRegistry::new();
        r.register(Box::new(EscapeFilter));
        r.register(Box::new(SafeFilter));
        r.register(Box::new(UpperFilter));
        r.register(Box::new(LowerFilter));
        r.register(Box::new(LengthFilter));
        r.register(Box::new(DefaultFilter));
        r.register(Box::new(TruncatecharsFilter));
        r.register(Box::new(HumanDateFilter));
        r
    })
}

/// Formats a timestamp the way snippet pages show it: `02 Jan 2026 at 15:04`,
/// in UTC.
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}

struct EscapeFilter;
impl Filter for EscapeFilter {
    fn name(&self) -> &'static str {
        "escape"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        if value.is_safe() {
            return Ok(value.clone());
        }
        Ok(ContextValue::SafeString(escape_html(&value.to_display_string())))
    }
}

struct SafeFilter;
impl Filter for SafeFilter {
    fn name(&self) -> &'static str {
        "safe"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        Ok(ContextValue::SafeString(value.to_display_string()))
    }
}

struct UpperFilter;
impl Filter for UpperFilter {
    fn name(&self) -> &'static str {
        "upper"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        Ok(ContextValue::String(value.to_display_string().to_uppercase()))
    }
}

struct LowerFilter;
impl Filter for LowerFilter {
    fn name(&self) -> &'static str {
        "lower"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        Ok(ContextValue::String(value.to_display_string().to_lowercase()))
    }
}

struct LengthFilter;
impl Filter for LengthFilter {
    fn name(&self) -> &'static str {
        "length"
    }
    #[allow(clippy::cast_possible_wrap)]
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        Ok(ContextValue::Integer(value.len().unwrap_or(0) as i64))
    }
}

struct DefaultFilter;
impl Filter for DefaultFilter {
    fn name(&self) -> &'static str {
        "default"
    }
    fn apply(
        &self,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        let fallback = args
            .first()
            .ok_or_else(|| TemplateError::filter_arg(self.name(), "requires an argument"))?;
        if value.is_truthy() {
            Ok(value.clone())
        } else {
            Ok(fallback.clone())
        }
    }
}

struct TruncatecharsFilter;
impl Filter for TruncatecharsFilter {
    fn name(&self) -> &'static str {
        "truncatechars"
    }
    fn apply(
        &self,
        value: &ContextValue,
        args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        let max_len = args
            .first()
            .and_then(ContextValue::as_integer)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                TemplateError::filter_arg(self.name(), "requires a non-negative integer argument")
            })?;
        let s = value.to_display_string();
        if s.chars().count() <= max_len {
            return Ok(ContextValue::String(s));
        }
        if max_len == 0 {
            return Ok(ContextValue::String(String::new()));
        }
        let mut truncated: String = s.chars().take(max_len - 1).collect();
        truncated.push('…');
        Ok(ContextValue::String(truncated))
    }
}

struct HumanDateFilter;
impl Filter for HumanDateFilter {
    fn name(&self) -> &'static str {
        "human_date"
    }
    fn apply(
        &self,
        value: &ContextValue,
        _args: &[ContextValue],
    ) -> Result<ContextValue, TemplateError> {
        let raw = match value {
            ContextValue::None => return Ok(ContextValue::String(String::new())),
            ContextValue::String(s) | ContextValue::SafeString(s) if s.is_empty() => {
                return Ok(ContextValue::String(String::new()));
            }
            ContextValue::String(s) | ContextValue::SafeString(s) => s,
            other => {
                return Err(TemplateError::filter_arg(
                    self.name(),
                    format!("expected an RFC 3339 timestamp, got '{other}'"),
                ));
            }
        };
        let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| {
            TemplateError::filter_arg(self.name(), format!("invalid timestamp '{raw}': {e}"))
        })?;
        Ok(ContextValue::String(human_date(&parsed.with_timezone(&Utc))))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn apply(name: &str, value: ContextValue, args: &[ContextValue]) -> ContextValue {
        default_registry().apply(name, &value, args).unwrap()
    }

    #[test]
    fn test_unknown_filter() {
        let err = default_registry()
            .apply("nope", &ContextValue::None, &[])
            .unwrap_err();
        assert_eq!(err, TemplateError::UnknownFilter("nope".into()));
    }

    #[test]
    fn test_escape_marks_safe_once() {
        let out = apply("escape", ContextValue::from("<b>"), &[]);
        assert!(out.is_safe());
        assert_eq!(out.to_display_string(), "&lt;b&gt;");
        let twice = apply("escape", out, &[]);
        assert_eq!(twice.to_display_string(), "&lt;b&gt;");
    }

    #[test]
    fn test_upper_lower() {
        assert_eq!(
            apply("upper", ContextValue::from("abc"), &[]).to_display_string(),
            "ABC"
        );
        assert_eq!(
            apply("lower", ContextValue::from("ÀB"), &[]).to_display_string(),
            "àb"
        );
    }

    #[test]
    fn test_length() {
        assert_eq!(
            apply("length", ContextValue::from("héllo"), &[]),
            ContextValue::Integer(5)
        );
        assert_eq!(
            apply("length", ContextValue::from(vec![1_i64, 2]), &[]),
            ContextValue::Integer(2)
        );
        assert_eq!(apply("length", ContextValue::None, &[]), ContextValue::Integer(0));
    }

    #[test]
    fn test_default() {
        let fallback = [ContextValue::from("n/a")];
        assert_eq!(
            apply("default", ContextValue::from(""), &fallback).to_display_string(),
            "n/a"
        );
        assert_eq!(
            apply("default", ContextValue::from("x"), &fallback).to_display_string(),
            "x"
        );
        assert!(default_registry()
            .apply("default", &ContextValue::None, &[])
            .is_err());
    }

    #[test]
    fn test_truncatechars_counts_characters() {
        let args = [ContextValue::Integer(4)];
        assert_eq!(
            apply("truncatechars", ContextValue::from("héllo wörld"), &args).to_display_string(),
            "hél…"
        );
        assert_eq!(
            apply("truncatechars", ContextValue::from("abcd"), &args).to_display_string(),
            "abcd"
        );
    }

    #[test]
    fn test_truncatechars_bad_argument() {
        let err = default_registry()
            .apply("truncatechars", &ContextValue::from("abc"), &[ContextValue::from("x")])
            .unwrap_err();
        assert!(matches!(err, TemplateError::FilterArgument { .. }));
    }

    #[test]
    fn test_human_date() {
        let t = Utc.with_ymd_and_hms(2026, 1, 2, 15, 4, 0).unwrap();
        assert_eq!(human_date(&t), "02 Jan 2026 at 15:04");
        assert_eq!(
            apply(
                "human_date",
                ContextValue::from("2026-01-02T17:04:00+02:00"),
                &[]
            )
            .to_display_string(),
            "02 Jan 2026 at 15:04"
        );
        assert_eq!(
            apply("human_date", ContextValue::None, &[]).to_display_string(),
            ""
        );
    }

    #[test]
    fn test_human_date_rejects_garbage() {
        assert!(default_registry()
            .apply("human_date", &ContextValue::from("yesterday"), &[])
            .is_err());
        assert!(default_registry()
            .apply("human_date", &ContextValue::Integer(5), &[])
            .is_err());
    }
}

//! Validation accumulator and reusable predicates.
//!
//! A form embeds a [`Validator`] by value and tags it `#[form(validator)]`.
//! The derive then implements [`Validated`] for the form, so handlers call
//! `form.check_field(..)` and `form.is_valid()` directly on the form.
//!
//! Errors accumulate rather than short-circuiting, so every problem in a
//! submission is reported at once. Only the first message recorded for a
//! field is kept.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// WHATWG-recommended pattern for `<input type="email">`.
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("valid regex")
});

/// Accumulates field-level and form-level validation errors.
///
/// Serializes as `{"field_errors": {..}, "non_field_errors": [..]}` so
/// templates can show each message next to its input. Forms usually
/// `#[serde(flatten)]` it to expose `form.field_errors.title` directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    field_errors: BTreeMap<String, String>,
    non_field_errors: Vec<String>,
}

impl Validator {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no errors of either kind have been recorded.
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Records `message` for `key` unless the key already has one.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Records a form-level error. Duplicates are kept.
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Records `message` for `key` when `ok` is false.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }

    /// Returns the message recorded for `key`.
    pub fn field_error(&self, key: &str) -> Option<&str> {
        self.field_errors.get(key).map(String::as_str)
    }

    /// Returns every field error, ordered by key.
    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    /// Returns the form-level errors in the order they were added.
    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field_errors
    }
}

/// A form that owns a [`Validator`].
///
/// Implemented by `#[derive(Form)]` when a field is tagged
/// `#[form(validator)]`. The provided methods forward to that field.
pub trait Validated {
    /// The embedded validator.
    fn validator(&self) -> &Validator;

    /// The embedded validator, mutably.
    fn validator_mut(&mut self) -> &mut Validator;

    /// See [`Validator::is_valid`].
    fn is_valid(&self) -> bool {
        self.validator().is_valid()
    }

    /// See [`Validator::check_field`].
    fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        self.validator_mut().check_field(ok, key, message);
    }

    /// See [`Validator::add_field_error`].
    fn add_field_error(&mut self, key: &str, message: &str) {
        self.validator_mut().add_field_error(key, message);
    }

    /// See [`Validator::add_non_field_error`].
    fn add_non_field_error(&mut self, message: &str) {
        self.validator_mut().add_non_field_error(message);
    }
}

/// `true` if `value` has at least one non-whitespace character.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `true` if `value` has at most `n` characters (Unicode scalar values).
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// `true` if `value` has at least `n` characters (Unicode scalar values).
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// `true` if `value` equals one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// `true` if `rx` matches `value`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// `true` if `value` looks like an email address.
pub fn valid_email(value: &str) -> bool {
    matches(value, &EMAIL_RX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validator_is_valid() {
        assert!(Validator::new().is_valid());
    }

    #[test]
    fn test_first_field_error_wins() {
        let mut v = Validator::new();
        v.add_field_error("title", "first");
        v.add_field_error("title", "second");
        assert_eq!(v.field_error("title"), Some("first"));
        assert_eq!(v.field_errors().len(), 1);
    }

    #[test]
    fn test_check_field_only_records_on_failure() {
        let mut v = Validator::new();
        v.check_field(true, "title", "should not appear");
        assert!(v.is_valid());
        v.check_field(false, "title", "This field cannot be blank");
        assert!(!v.is_valid());
        assert_eq!(v.field_error("title"), Some("This field cannot be blank"));
    }

    #[test]
    fn test_non_field_errors_alone_make_invalid() {
        let mut v = Validator::new();
        v.add_non_field_error("Email or password is incorrect");
        v.add_non_field_error("Email or password is incorrect");
        assert!(!v.is_valid());
        assert_eq!(v.non_field_errors().len(), 2);
        assert!(v.field_errors().is_empty());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("x"));
        assert!(!not_blank(""));
        assert!(!not_blank("   \t\n"));
        assert!(not_blank("  a  "));
    }

    #[test]
    fn test_max_chars_counts_characters_not_bytes() {
        let title = "é".repeat(150);
        assert_eq!(title.len(), 300);
        assert!(max_chars(&title, 150));
        assert!(!max_chars(&"é".repeat(151), 150));
    }

    #[test]
    fn test_min_chars() {
        assert!(min_chars("password", 8));
        assert!(!min_chars("pass", 8));
        assert!(min_chars("", 0));
    }

    #[test]
    fn test_permitted_value() {
        assert!(permitted_value(&7, &[1, 7, 365]));
        assert!(!permitted_value(&30, &[1, 7, 365]));
        assert!(permitted_value(&"b", &["a", "b"]));
    }

    #[test]
    fn test_valid_email() {
        assert!(valid_email("alice@example.com"));
        assert!(valid_email("a.b+tag@sub.example.co.uk"));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("alice@-example.com"));
    }

    #[test]
    fn test_serialized_shape() {
        let mut v = Validator::new();
        v.add_field_error("title", "This field cannot be blank");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["field_errors"]["title"], "This field cannot be blank");
        assert_eq!(json["non_field_errors"], serde_json::json!([]));
    }
}

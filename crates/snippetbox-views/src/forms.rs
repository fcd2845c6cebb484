//! The forms behind the create-snippet and signup pages.

use serde::Serialize;
use snippetbox_forms::validator::{max_chars, min_chars, not_blank, permitted_value, valid_email};
use snippetbox_forms::{Form, Validated, Validator};

/// Expiry choices offered on the create page, in days.
pub const PERMITTED_EXPIRY_DAYS: [i64; 3] = [1, 7, 365];

/// Message shown for an empty required field.
pub const BLANK_MESSAGE: &str = "This field cannot be blank";

/// The create-snippet form.
#[derive(Debug, Clone, Serialize, Form)]
pub struct SnippetCreateForm {
    pub title: String,
    pub content: String,
    pub expired: i64,
    #[serde(flatten)]
    #[form(validator)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expired: 1,
            validator: Validator::new(),
        }
    }
}

impl SnippetCreateForm {
    /// Runs every field check, recording failures on the embedded validator.
    pub fn validate(&mut self) {
        let title_ok = not_blank(&self.title);
        self.check_field(title_ok, "title", BLANK_MESSAGE);
        let title_short = max_chars(&self.title, 150);
        self.check_field(
            title_short,
            "title",
            "This field cannot be more than 150 characters long",
        );
        let content_ok = not_blank(&self.content);
        self.check_field(content_ok, "content", BLANK_MESSAGE);
        let expired_ok = permitted_value(&self.expired, &PERMITTED_EXPIRY_DAYS);
        self.check_field(expired_ok, "expired", "This field must equal 1, 7 or 365");
    }
}

/// The signup form.
#[derive(Debug, Clone, Default, Serialize, Form)]
pub struct UserSignupForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(flatten)]
    #[form(validator)]
    pub validator: Validator,
}

impl UserSignupForm {
    /// Runs every field check, recording failures on the embedded validator.
    pub fn validate(&mut self) {
        let name_ok = not_blank(&self.name);
        self.check_field(name_ok, "name", BLANK_MESSAGE);
        let email_ok = not_blank(&self.email);
        self.check_field(email_ok, "email", BLANK_MESSAGE);
        let email_valid = valid_email(&self.email);
        self.check_field(email_valid, "email", "This field must be a valid email address");
        let password_ok = not_blank(&self.password);
        self.check_field(password_ok, "password", BLANK_MESSAGE);
        let password_long = min_chars(&self.password, 8);
        self.check_field(
            password_long,
            "password",
            "This field must be at least 8 characters long",
        );
    }
}

#[cfg(test)]
mod tests {
    use snippetbox_forms::{decode, FormData};

    use super::*;

    #[test]
    fn test_create_form_defaults() {
        let form = SnippetCreateForm::default();
        assert_eq!(form.expired, 1);
        assert!(form.is_valid());
    }

    #[test]
    fn test_create_form_valid() {
        let mut form = SnippetCreateForm::default();
        decode(&FormData::parse("title=Hello&content=World&expired=7"), &mut form).unwrap();
        form.validate();
        assert!(form.is_valid());
    }

    #[test]
    fn test_create_form_errors() {
        let mut form = SnippetCreateForm {
            title: "x".repeat(151),
            content: "   ".into(),
            expired: 3,
            ..SnippetCreateForm::default()
        };
        form.validate();
        let v = form.validator();
        assert_eq!(
            v.field_error("title"),
            Some("This field cannot be more than 150 characters long")
        );
        assert_eq!(v.field_error("content"), Some(BLANK_MESSAGE));
        assert_eq!(v.field_error("expired"), Some("This field must equal 1, 7 or 365"));
    }

    #[test]
    fn test_blank_title_reports_blank_only() {
        let mut form = SnippetCreateForm {
            content: "body".into(),
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert_eq!(form.validator().field_error("title"), Some(BLANK_MESSAGE));
        assert_eq!(form.validator().field_errors().len(), 1);
    }

    #[test]
    fn test_title_length_counts_characters() {
        let mut form = SnippetCreateForm {
            title: "é".repeat(150),
            content: "body".into(),
            ..SnippetCreateForm::default()
        };
        form.validate();
        assert!(form.is_valid());
    }

    #[test]
    fn test_signup_form_errors() {
        let mut form = UserSignupForm {
            name: String::new(),
            email: "not-an-email".into(),
            password: "short".into(),
            ..UserSignupForm::default()
        };
        form.validate();
        let v = form.validator();
        assert_eq!(v.field_error("name"), Some(BLANK_MESSAGE));
        assert_eq!(
            v.field_error("email"),
            Some("This field must be a valid email address")
        );
        assert_eq!(
            v.field_error("password"),
            Some("This field must be at least 8 characters long")
        );
    }

    #[test]
    fn test_signup_form_valid() {
        let mut form = UserSignupForm::default();
        decode(
            &FormData::parse("name=Alice&email=alice%40example.com&password=pa55word!"),
            &mut form,
        )
        .unwrap();
        form.validate();
        assert!(form.is_valid());
        assert_eq!(form.email, "alice@example.com");
    }

    #[test]
    fn test_signup_password_never_serialized() {
        let form = UserSignupForm {
            password: "secret-password".into(),
            ..UserSignupForm::default()
        };
        let json = serde_json::to_value(&form).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("field_errors").is_some());
    }
}

//! # snippetbox-forms
//!
//! Form handling for snippetbox, split into two independent steps:
//!
//! 1. **Binding** ([`binder`]): decode a [`FormData`] payload into a typed
//!    struct using `#[derive(Form)]` field tags. A value that cannot be
//!    coerced to the field's type is a [`DecodeError`], which callers treat
//!    as a malformed request.
//! 2. **Validation** ([`validator`]): semantic checks on the well-typed
//!    values, accumulated in a [`Validator`] that the form owns by value.
//!
//! ```
//! use snippetbox_forms::{decode, Form, FormData, Validated, Validator};
//! use snippetbox_forms::validator::not_blank;
//!
//! #[derive(Debug, Default, Form)]
//! struct CommentForm {
//!     body: String,
//!     #[form(name = "notify")]
//!     notify_author: bool,
//!     #[form(validator)]
//!     validator: Validator,
//! }
//!
//! let data = FormData::parse("body=Nice+post&notify=on");
//! let mut form = CommentForm::default();
//! decode(&data, &mut form).unwrap();
//!
//! let ok = not_blank(&form.body);
//! form.check_field(ok, "body", "This field cannot be blank");
//! assert!(form.is_valid());
//! assert!(form.notify_author);
//! ```

// Lets the derive's `::snippetbox_forms::` paths resolve inside this crate's own tests.
extern crate self as snippetbox_forms;

pub mod binder;
pub mod form_data;
pub mod validator;

pub use binder::{decode, DecodeError, DecodeErrorKind, Form, FormScalar, FormValue};
pub use form_data::FormData;
pub use snippetbox_macros::Form;
pub use validator::{Validated, Validator};

//! # snippetbox-macros
//!
//! Procedural macros for snippetbox. Use them through `snippetbox-forms`,
//! which re-exports [`Form`](macro@Form) next to the trait of the same name.
//!
//! This crate is independent of the other snippetbox crates because
//! proc-macro crates cannot depend on crates that use them.

mod form;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `snippetbox_forms::Form` and, when a field is tagged
/// `#[form(validator)]`, `snippetbox_forms::Validated`.
///
/// Field attributes:
///
/// - `#[form(name = "key")]` binds the field from payload key `key`
///   instead of the field name.
/// - `#[form(skip)]` never binds the field.
/// - `#[form(validator)]` marks the embedded `Validator`. At most one field
///   may carry it, and it is never bound.
#[proc_macro_derive(Form, attributes(form))]
pub fn derive_form(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    form::derive_form_impl(&input).into()
}

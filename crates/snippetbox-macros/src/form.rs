//! `#[derive(Form)]` implementation.
//!
//! Generates a `snippetbox_forms::Form` impl that binds each field from its
//! payload key, plus a `snippetbox_forms::Validated` impl forwarding to the
//! field tagged `#[form(validator)]`.

use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// Struct-level options. The derive takes none of its own; darling is used
/// for the named-struct shape check and field collection.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(form), supports(struct_named))]
pub struct FormOpts {
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    pub data: darling::ast::Data<(), FormFieldOpts>,
}

/// Per-field options from `#[form(...)]`.
#[derive(Debug, FromField)]
#[darling(attributes(form))]
pub struct FormFieldOpts {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    /// Payload key override.
    #[darling(default)]
    pub name: Option<String>,

    /// Exclude the field from binding.
    #[darling(default)]
    pub skip: bool,

    /// This field is the form's `Validator`.
    #[darling(default)]
    pub validator: bool,
}

impl FormFieldOpts {
    /// The payload key the field binds from.
    fn key(&self, ident: &syn::Ident) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string())
    }
}

/// Generates the `Form` (and possibly `Validated`) implementations.
pub fn derive_form_impl(input: &DeriveInput) -> TokenStream {
    let opts = match FormOpts::from_derive_input(input) {
        Ok(o) => o,
        Err(e) => return e.write_errors(),
    };

    let struct_name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let Some(fields) = opts.data.as_ref().take_struct() else {
        return darling::Error::unsupported_shape("expected a struct with named fields")
            .write_errors();
    };

    let mut errors = darling::Error::accumulator();
    let mut keys = Vec::new();
    let mut bind_stmts = Vec::new();
    let mut validator_field: Option<&syn::Ident> = None;

    for f in fields.iter() {
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };

        if f.validator {
            if f.name.is_some() || f.skip {
                errors.push(
                    darling::Error::custom(
                        "`validator` cannot be combined with `name` or `skip`",
                    )
                    .with_span(ident),
                );
            }
            if validator_field.is_some() {
                errors.push(
                    darling::Error::custom("only one field may be tagged `#[form(validator)]`")
                        .with_span(ident),
                );
            }
            validator_field = Some(ident);
            continue;
        }
        if f.skip {
            continue;
        }

        let key = f.key(ident);
        if keys.contains(&key) {
            errors.push(
                darling::Error::custom(format!("duplicate form key `{key}`")).with_span(ident),
            );
            continue;
        }
        let ty = &f.ty;
        bind_stmts.push(quote! {
            ::snippetbox_forms::binder::bind_field::<#ty>(data, #key, &mut self.#ident)?;
        });
        keys.push(key);
    }

    if let Err(e) = errors.finish() {
        return e.write_errors();
    }

    let validated_impl = validator_field.map(|field| {
        quote! {
            impl #impl_generics ::snippetbox_forms::Validated for #struct_name #ty_generics #where_clause {
                fn validator(&self) -> &::snippetbox_forms::Validator {
                    &self.#field
                }

                fn validator_mut(&mut self) -> &mut ::snippetbox_forms::Validator {
                    &mut self.#field
                }
            }
        }
    });

    quote! {
        impl #impl_generics ::snippetbox_forms::binder::Form for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn bind(
                &mut self,
                data: &::snippetbox_forms::FormData,
            ) -> ::core::result::Result<(), ::snippetbox_forms::DecodeError> {
                #(#bind_stmts)*
                ::core::result::Result::Ok(())
            }

            fn field_keys() -> &'static [&'static str] {
                &[#(#keys),*]
            }
        }

        #validated_impl
    }
}

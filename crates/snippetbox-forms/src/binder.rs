//! Declarative form binding.
//!
//! A struct opts in with `#[derive(Form)]`. Each field is bound from the
//! payload key named by `#[form(name = "...")]`, or from the field's own
//! name when no tag is given. Fields tagged `#[form(skip)]` or
//! `#[form(validator)]` are never touched by binding.
//!
//! Binding only writes fields whose key is present in the payload; an absent
//! key leaves the field at whatever value the caller initialised it with,
//! which is how forms carry defaults. A present value that cannot be coerced
//! to the field's type aborts binding with a [`DecodeError`].

use thiserror::Error;

use crate::form_data::FormData;

/// The reason a single form value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// The value is not a base-10 integer that fits the field's type.
    #[error("'{value}' is not a valid {ty}")]
    InvalidInteger {
        /// The raw value that failed.
        value: String,
        /// The Rust type the field expected.
        ty: &'static str,
    },
    /// The value is not one of the recognised boolean tokens.
    #[error("'{value}' is not a valid boolean")]
    InvalidBoolean {
        /// The raw value that failed.
        value: String,
    },
    /// A custom [`FormScalar`] implementation rejected the value.
    #[error("{0}")]
    Invalid(String),
}

/// A payload value could not be coerced into the target field's type.
///
/// Decode errors mean the request itself is malformed. They are kept apart
/// from validation failures, which describe well-typed but unacceptable
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("form field '{field}': {kind}")]
pub struct DecodeError {
    /// The payload key whose value failed.
    pub field: String,
    /// Why it failed.
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Creates a new decode error for the given payload key.
    pub fn new(field: impl Into<String>, kind: DecodeErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// A type that can be bound from a [`FormData`] payload.
///
/// Implemented by `#[derive(Form)]`; hand-written impls are possible but
/// rarely needed.
pub trait Form {
    /// Writes every present, bindable key of `data` into `self`.
    ///
    /// On error `self` may have been partially updated.
    fn bind(&mut self, data: &FormData) -> Result<(), DecodeError>;

    /// The payload keys this form reads, in field declaration order.
    fn field_keys() -> &'static [&'static str];
}

/// Decodes `data` into `target`.
///
/// Fields whose key is absent keep their current value. Unknown keys in the
/// payload are ignored.
///
/// # Errors
///
/// Returns a [`DecodeError`] naming the first key whose value could not be
/// coerced into its field's type.
pub fn decode<F: Form + ?Sized>(data: &FormData, target: &mut F) -> Result<(), DecodeError> {
    target.bind(data)
}

/// Binds the values for `key` into `slot` if the key is present.
///
/// This is what the derive expands to for each bindable field.
///
/// # Errors
///
/// Returns a [`DecodeError`] for `key` if the values cannot be coerced.
pub fn bind_field<T: FormValue>(
    data: &FormData,
    key: &str,
    slot: &mut T,
) -> Result<(), DecodeError> {
    if let Some(values) = data.get_list(key) {
        *slot = T::from_form_values(values).map_err(|kind| DecodeError::new(key, kind))?;
    }
    Ok(())
}

/// Conversion from a single raw form value.
///
/// Implement this for your own types to make them bindable as a plain
/// field, inside a `Vec`, or inside an `Option`.
pub trait FormScalar: Sized {
    /// Converts one raw value.
    ///
    /// # Errors
    ///
    /// Returns the reason the value was rejected.
    fn from_form_value(value: &str) -> Result<Self, DecodeErrorKind>;
}

/// Conversion from every raw value sent for one key.
///
/// Scalars read the first value; `Vec<T>` reads all of them in order;
/// `Option<T>` becomes `Some` once the key is present.
pub trait FormValue: Sized {
    /// Converts the values sent for one key.
    ///
    /// # Errors
    ///
    /// Returns the reason the values were rejected.
    fn from_form_values(values: &[String]) -> Result<Self, DecodeErrorKind>;
}

impl FormScalar for String {
    fn from_form_value(value: &str) -> Result<Self, DecodeErrorKind> {
        Ok(value.to_string())
    }
}

const TRUE_TOKENS: &[&str] = &["1", "t", "T", "true", "TRUE", "True", "on"];
const FALSE_TOKENS: &[&str] = &["0", "f", "F", "false", "FALSE", "False", "off"];

impl FormScalar for bool {
    fn from_form_value(value: &str) -> Result<Self, DecodeErrorKind> {
        if TRUE_TOKENS.contains(&value) {
            Ok(true)
        } else if FALSE_TOKENS.contains(&value) {
            Ok(false)
        } else {
            Err(DecodeErrorKind::InvalidBoolean {
                value: value.to_string(),
            })
        }
    }
}

macro_rules! int_form_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl FormScalar for $t {
                fn from_form_value(value: &str) -> Result<Self, DecodeErrorKind> {
                    value.parse::<$t>().map_err(|_| DecodeErrorKind::InvalidInteger {
                        value: value.to_string(),
                        ty: stringify!($t),
                    })
                }
            }
        )*
    };
}

int_form_scalar!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! scalar_form_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl FormValue for $t {
                fn from_form_values(values: &[String]) -> Result<Self, DecodeErrorKind> {
                    let first = values.first().map_or("", String::as_str);
                    <$t as FormScalar>::from_form_value(first)
                }
            }
        )*
    };
}

scalar_form_value!(
    String, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

impl<T: FormScalar> FormValue for Vec<T> {
    fn from_form_values(values: &[String]) -> Result<Self, DecodeErrorKind> {
        values.iter().map(|v| T::from_form_value(v)).collect()
    }
}

impl<T: FormScalar> FormValue for Option<T> {
    fn from_form_values(values: &[String]) -> Result<Self, DecodeErrorKind> {
        values
            .first()
            .map(|v| T::from_form_value(v))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_string_takes_first_value() {
        let v = String::from_form_values(&vals(&["a", "b"])).unwrap();
        assert_eq!(v, "a");
    }

    #[test]
    fn test_int_accepts_sign() {
        assert_eq!(i32::from_form_values(&vals(&["-7"])).unwrap(), -7);
        assert_eq!(i32::from_form_values(&vals(&["+7"])).unwrap(), 7);
    }

    #[test]
    fn test_int_rejects_garbage() {
        let err = i32::from_form_values(&vals(&["abc"])).unwrap_err();
        assert_eq!(
            err,
            DecodeErrorKind::InvalidInteger {
                value: "abc".into(),
                ty: "i32"
            }
        );
    }

    #[test]
    fn test_int_rejects_empty_and_whitespace() {
        assert!(i64::from_form_values(&vals(&[""])).is_err());
        assert!(i64::from_form_values(&vals(&[" 7"])).is_err());
    }

    #[test]
    fn test_int_overflow() {
        assert!(u8::from_form_values(&vals(&["256"])).is_err());
        assert!(u32::from_form_values(&vals(&["-1"])).is_err());
    }

    #[test]
    fn test_bool_tokens() {
        for token in TRUE_TOKENS {
            assert!(bool::from_form_value(token).unwrap(), "{token}");
        }
        for token in FALSE_TOKENS {
            assert!(!bool::from_form_value(token).unwrap(), "{token}");
        }
    }

    #[test]
    fn test_bool_rejects_unknown_and_empty() {
        assert!(matches!(
            bool::from_form_value("yes"),
            Err(DecodeErrorKind::InvalidBoolean { .. })
        ));
        assert!(bool::from_form_value("").is_err());
    }

    #[test]
    fn test_vec_reads_all_values() {
        let v = Vec::<u32>::from_form_values(&vals(&["3", "1", "2"])).unwrap();
        assert_eq!(v, vec![3, 1, 2]);
    }

    #[test]
    fn test_vec_fails_on_any_bad_element() {
        assert!(Vec::<u32>::from_form_values(&vals(&["3", "x"])).is_err());
    }

    #[test]
    fn test_option_is_some_when_present() {
        let v = Option::<i32>::from_form_values(&vals(&["5"])).unwrap();
        assert_eq!(v, Some(5));
        let none = Option::<i32>::from_form_values(&[]).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_bind_field_absent_key_keeps_value() {
        let data = FormData::parse("other=1");
        let mut slot = 42_i32;
        bind_field(&data, "expired", &mut slot).unwrap();
        assert_eq!(slot, 42);
    }

    #[test]
    fn test_bind_field_error_names_key() {
        let data = FormData::parse("expired=abc");
        let mut slot = 1_i32;
        let err = bind_field(&data, "expired", &mut slot).unwrap_err();
        assert_eq!(err.field, "expired");
        assert_eq!(err.to_string(), "form field 'expired': 'abc' is not a valid i32");
    }
}

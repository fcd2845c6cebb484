//! Incoming form payloads.
//!
//! [`FormData`] is the binder's input: a mapping from field names to one or
//! more string values, in the shape produced by
//! `application/x-www-form-urlencoded` request bodies.

use snippetbox_core::utils::MultiValueDict;

/// A decoded form payload.
///
/// # Examples
///
/// ```
/// use snippetbox_forms::FormData;
///
/// let data = FormData::parse("tag=a&tag=b&title=Hello+World");
/// assert_eq!(data.get("title"), Some("Hello World"));
/// assert_eq!(data.get_list("tag").unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    data: MultiValueDict<String, String>,
}

impl FormData {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a urlencoded string (a request body or a query string).
    ///
    /// `+` decodes to a space and percent escapes are resolved. Invalid
    /// UTF-8 sequences are replaced rather than rejected.
    pub fn parse(input: &str) -> Self {
        Self::from_bytes(input.as_bytes())
    }

    /// Parses a urlencoded byte body.
    pub fn from_bytes(body: &[u8]) -> Self {
        url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Appends a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.append(key.into(), value.into());
    }

    /// Returns every value sent for `key`, in payload order.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get_list(key)
    }

    /// Returns the first value sent for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.first(key).map(String::as_str)
    }

    /// Returns `true` if `key` was sent at all.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

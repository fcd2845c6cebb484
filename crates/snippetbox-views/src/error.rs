//! Error types for the view layer's collaborators.

use thiserror::Error;

/// A failure from a snippet or user store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No live record matches the lookup.
    #[error("models: no matching record found")]
    NoRecord,

    /// A user with this email address already exists.
    #[error("models: duplicate email")]
    DuplicateEmail,

    /// The password could not be hashed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// A failure from a session store.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The session does not exist or has expired.
    #[error("Session '{0}' not found")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::NoRecord.to_string(),
            "models: no matching record found"
        );
        assert_eq!(StoreError::DuplicateEmail.to_string(), "models: duplicate email");
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::NotFound("abc".into());
        assert_eq!(err.to_string(), "Session 'abc' not found");
    }
}

//! Error types for grimoire.

use thiserror::Error;

use crate::models::EntityKind;

/// Result type alias using grimoire's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for grimoire operations.
///
/// Validation variants are raised before any mutating store call executes;
/// store-level unique violations are translated into [`Error::DuplicateName`]
/// at the database boundary and never surfaced raw.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed entity identifier in a path parameter or request body
    #[error("The `id` is not valid: {0}")]
    InvalidId(String),

    /// Note create/update without a usable title
    #[error("Missing `title` in request body")]
    MissingTitle,

    /// A referenced tag/folder id does not resolve under the caller's ownership
    #[error("The `{0}s` contains an invalid id")]
    InvalidReference(EntityKind),

    /// Store-level (name, owner) uniqueness violation
    #[error("{kind} name `{name}` already exists")]
    DuplicateName { kind: EntityKind, name: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File/socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_id() {
        let err = Error::InvalidId("abc".to_string());
        assert_eq!(err.to_string(), "The `id` is not valid: abc");
    }

    #[test]
    fn test_error_display_missing_title() {
        assert_eq!(
            Error::MissingTitle.to_string(),
            "Missing `title` in request body"
        );
    }

    #[test]
    fn test_error_display_invalid_reference() {
        let err = Error::InvalidReference(EntityKind::Folder);
        assert_eq!(err.to_string(), "The `folders` contains an invalid id");
        let err = Error::InvalidReference(EntityKind::Tag);
        assert_eq!(err.to_string(), "The `tags` contains an invalid id");
    }

    #[test]
    fn test_error_display_duplicate_name() {
        let err = Error::DuplicateName {
            kind: EntityKind::Tag,
            name: "urgent".to_string(),
        };
        assert_eq!(err.to_string(), "tag name `urgent` already exists");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("note".to_string());
        assert_eq!(err.to_string(), "Not found: note");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }
}

//! Error types for the core library.

use thiserror::Error;

use crate::account::{RoleId, ValidationError, validation};
use crate::service::Status;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more payload fields failed validation.
    #[error("{}", validation::digest(.0))]
    Validation(Vec<ValidationError>),

    /// Another account already uses this username.
    #[error("User with username '{0}' already exists")]
    DuplicateUsername(String),

    /// No account matched the lookup key.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// A payload referenced a role that does not exist.
    #[error("Unknown role: {0}")]
    UnknownRole(RoleId),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl Error {
    /// Classifies the error into a response status.
    ///
    /// Client mistakes map to `BadRequest` or `NotFound`; store and hashing
    /// failures are server faults.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::DuplicateUsername(_) | Self::UnknownRole(_) => {
                Status::BadRequest
            }
            Self::AccountNotFound(_) => Status::NotFound,
            Self::Database(_) | Self::Hash(_) => Status::InternalServerError,
        }
    }

    /// Whether the error is a server fault rather than a client mistake.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(self.status(), Status::InternalServerError)
    }
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_displays_digest() {
        let err = Error::from(vec![
            ValidationError::EmptyUsername,
            ValidationError::EmptyEmail,
        ]);
        assert_eq!(err.to_string(), "Username is required; Email is required");
        assert_eq!(err.status(), Status::BadRequest);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            Error::DuplicateUsername("bob".to_string()).status(),
            Status::BadRequest
        );
        assert_eq!(
            Error::AccountNotFound("id 3".to_string()).status(),
            Status::NotFound
        );
        assert_eq!(Error::UnknownRole(RoleId::new(9)).status(), Status::BadRequest);
        assert!(Error::Database(sqlx::Error::PoolClosed).is_server_fault());
    }

    #[test]
    fn test_duplicate_message_names_username() {
        let err = Error::DuplicateUsername("bob".to_string());
        assert_eq!(err.to_string(), "User with username 'bob' already exists");
    }
}

//! Account payload validation.

use super::model::AccountPayload;

/// Oldest accepted age. Ages are stored in a single signed byte.
pub const MAX_AGE: i16 = 127;

/// Longest accepted password in bytes. Bcrypt ignores anything past this.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validation error for an account payload.
///
/// Variants are listed in the order fields are checked; the digest built
/// from them keeps that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    EmptyUsername,
    /// Password is empty.
    EmptyPassword,
    /// Password is longer than bcrypt can hash.
    PasswordTooLong,
    /// First name is empty.
    EmptyFirstName,
    /// Last name is empty.
    EmptyLastName,
    /// Age is outside `0..=127`.
    InvalidAge,
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// No roles were assigned.
    NoRoles,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "Username is required",
            Self::EmptyPassword => "Password is required",
            Self::PasswordTooLong => "Password must be at most 72 bytes",
            Self::EmptyFirstName => "First name is required",
            Self::EmptyLastName => "Last name is required",
            Self::InvalidAge => "Age must be between 0 and 127",
            Self::EmptyEmail => "Email is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::NoRoles => "At least one role is required",
        }
    }

    /// Get the wire field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "username",
            Self::EmptyPassword | Self::PasswordTooLong => "password",
            Self::EmptyFirstName => "firstName",
            Self::EmptyLastName => "lastName",
            Self::InvalidAge => "age",
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::NoRoles => "roles",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account payload.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account payload.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all errors
/// in declared field order.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_account(payload: &AccountPayload) -> ValidationResult {
    let mut errors = Vec::new();

    // Credentials
    if payload.username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    }
    if payload.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    } else if payload.password.len() > MAX_PASSWORD_BYTES {
        errors.push(ValidationError::PasswordTooLong);
    }

    // Profile
    if payload.first_name.trim().is_empty() {
        errors.push(ValidationError::EmptyFirstName);
    }
    if payload.last_name.trim().is_empty() {
        errors.push(ValidationError::EmptyLastName);
    }
    if !(0..=MAX_AGE).contains(&payload.age) {
        errors.push(ValidationError::InvalidAge);
    }

    // Email validation
    if payload.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(&payload.email) {
        errors.push(ValidationError::InvalidEmail);
    }

    if payload.roles.is_empty() {
        errors.push(ValidationError::NoRoles);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Joins validation messages into the client-visible digest.
///
/// Messages keep the order they were reported in and are separated by `"; "`.
#[must_use]
pub fn digest(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Must contain exactly one @
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') || local.is_empty() {
        return false;
    }

    // Domain must contain at least one dot and no empty labels
    if !domain.contains('.') {
        return false;
    }
    !domain.split('.').any(str::is_empty)
}

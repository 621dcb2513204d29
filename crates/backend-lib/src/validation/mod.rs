// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.
//!
//! Turns the loosely-typed wire payload into a [`Credentials`] value that the
//! auth service can trust, or a [`ValidationError`] that maps to a 400.

use std::fmt;

use thiserror::Error;
use warden_common::CredentialsPayload;
use zeroize::Zeroizing;

// Common validation constants
pub const MAX_USERNAME_LENGTH: usize = 254; // RFC 5321 SMTP limit, usernames are often emails
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} must be at most {max} bytes")]
    TooLong { field: &'static str, max: usize },
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A username/password pair that passed validation.
///
/// The password is wiped from memory when the value is dropped.
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validate a signup/login payload
pub fn validate_credentials(payload: CredentialsPayload) -> ValidationResult<Credentials> {
    let username = require("username", payload.username, MAX_USERNAME_LENGTH)?;
    let password = Zeroizing::new(require("password", payload.password, MAX_PASSWORD_LENGTH)?);

    Ok(Credentials { username, password })
}

fn require(field: &'static str, value: Option<String>, max: usize) -> ValidationResult<String> {
    let value = value.ok_or(ValidationError::MissingField(field))?;

    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if value.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }

    Ok(value)
}

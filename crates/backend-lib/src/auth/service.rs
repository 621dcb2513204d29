// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, which is used for authentication
use async_trait::async_trait;

use crate::error::AppError;
use crate::validation::Credentials;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new identity. Fails with `UserExists` if it is taken.
    async fn signup(&self, credentials: Credentials) -> Result<(), AppError>;

    /// Check credentials and return a signed token.
    ///
    /// Unknown identity and wrong password both fail with `InvalidCredentials`.
    async fn login(&self, credentials: Credentials) -> Result<String, AppError>;
}

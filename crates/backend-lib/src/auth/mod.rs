// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use password::CredentialHasher;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{Claims, SigningKey, TokenError, TokenIssuer, TOKEN_ISSUER, TOKEN_TTL_SECS};

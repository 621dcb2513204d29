// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed token issuance.
//!
//! Tokens are HS256 JWTs carrying exactly `iss`, `sub`, `exp` and `iat`.
//! Downstream services verify them with the shared secret, so the algorithm,
//! the claim names and [`TOKEN_ISSUER`] are a wire contract.
use std::fmt;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::config::{AuthSettings, ConfigError};

/// Validity window of every issued token (24 hours)
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// `iss` claim of every issued token
pub const TOKEN_ISSUER: &str = "wid-auth-service";

/// Shortest accepted HMAC secret (256 bits)
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Claims carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// HMAC secret shared with token verifiers.
///
/// The bytes are zeroed on drop and never printed.
pub struct SigningKey(Zeroizing<Vec<u8>>);

impl SigningKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        if secret.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::WeakSigningKey {
                len: secret.len(),
                min: MIN_SIGNING_KEY_LEN,
            });
        }
        Ok(Self(secret))
    }

    /// Take the key from `auth.jwt_secret`; absence is fatal
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        match settings.jwt_secret.as_deref() {
            Some(secret) => Self::new(secret.as_bytes()),
            None => Err(ConfigError::MissingSigningKey),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Issues (and, for downstream use, verifies) signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding: EncodingKey::from_secret(key.as_bytes()),
            decoding: DecodingKey::from_secret(key.as_bytes()),
        }
    }

    /// Issue a token for `subject` valid from now for [`TOKEN_TTL_SECS`]
    pub fn issue(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue a token as if the current unix time were `issued_at`.
    ///
    /// Identical inputs produce identical tokens.
    pub fn issue_at(&self, subject: &str, issued_at: i64) -> Result<String, TokenError> {
        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: subject.to_string(),
            exp: issued_at + TOKEN_TTL_SECS,
            iat: issued_at,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Check signature, issuer and expiry (no leeway) and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(err),
            })
    }
}

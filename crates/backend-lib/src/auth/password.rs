// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::{ConfigError, HashSettings};
use crate::store::CredentialHash;

/// Argon2id hasher with fixed cost parameters.
///
/// New hashes use the configured cost; verification reads algorithm, cost and
/// salt from the PHC string itself, so older hashes keep verifying after a
/// cost change.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Shared across clones so work done on the blocking pool is counted
    #[cfg(test)]
    verifications: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl CredentialHasher {
    pub fn new(settings: &HashSettings) -> Result<Self, ConfigError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| ConfigError::Invalid {
            field: "auth.hash",
            reason: e.to_string(),
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            #[cfg(test)]
            verifications: Default::default(),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<CredentialHash, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(plain.as_bytes(), &salt)?;
        Ok(CredentialHash::new(hash.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The digest comparison is constant-time. An unparsable hash verifies as false.
    pub fn verify(&self, hash: &CredentialHash, plain: &str) -> bool {
        #[cfg(test)]
        self.verifications
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let parsed_hash = match PasswordHash::new(hash.as_str()) {
            Ok(h) => h,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(plain.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
impl CredentialHasher {
    /// Number of `verify` calls made through this hasher or its clones
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(std::sync::atomic::Ordering::SeqCst)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tokio::task;
use tracing::{info, warn};

use crate::auth::{AuthService, CredentialHasher, TokenIssuer};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, SIGNUP_CONFLICT, SIGNUP_CREATED};
use crate::store::{CredentialHash, CredentialStore, StoreError};
use crate::validation::Credentials;

/// Auth service over any credential store.
///
/// Hashing and verification run on the blocking pool.
pub struct DefaultAuth {
    store: Arc<dyn CredentialStore>,
    issuer: Arc<TokenIssuer>,
    hasher: CredentialHasher,
    /// Verified against on unknown identities so both login failures cost one hash.
    dummy_hash: CredentialHash,
}

impl DefaultAuth {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: Arc<TokenIssuer>,
        hasher: CredentialHasher,
    ) -> Result<Self, AppError> {
        let dummy_password = uuid::Uuid::new_v4().to_string();
        let dummy_hash = hasher
            .hash(&dummy_password)
            .map_err(|e| AppError::Internal(format!("failed to prepare dummy hash: {e}")))?;

        Ok(Self {
            store,
            issuer,
            hasher,
            dummy_hash,
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn signup(&self, credentials: Credentials) -> Result<(), AppError> {
        let Credentials { username, password } = credentials;

        let hasher = self.hasher.clone();
        let hash = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;

        match self.store.insert(&username, hash).await {
            Ok(()) => {
                counter!(SIGNUP_CREATED).increment(1);
                info!(user = %username, "user signed up");
                Ok(())
            },
            Err(StoreError::AlreadyExists(_)) => {
                counter!(SIGNUP_CONFLICT).increment(1);
                info!(user = %username, "signup rejected, user exists");
                Err(AppError::UserExists)
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn login(&self, credentials: Credentials) -> Result<String, AppError> {
        let Credentials { username, password } = credentials;

        let stored = match self.store.lookup(&username).await {
            Ok(hash) => Some(hash),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let hasher = self.hasher.clone();
        let dummy = self.dummy_hash.clone();
        let verified = task::spawn_blocking(move || match stored {
            Some(hash) => hasher.verify(&hash, &password),
            None => {
                // Burn the same verification cost as a real mismatch
                let _ = hasher.verify(&dummy, &password);
                false
            },
        })
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?;

        if !verified {
            counter!(LOGIN_FAILURE).increment(1);
            warn!(user = %username, "login failed");
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(&username)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        counter!(LOGIN_SUCCESS).increment(1);
        info!(user = %username, "user logged in");
        Ok(token)
    }
}

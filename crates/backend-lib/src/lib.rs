// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core library for the warden identity platform: the auth service and the
//! gateway in front of it.

pub mod auth;
pub mod auth_router;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, CredentialHasher, DefaultAuth, SigningKey, TokenIssuer};
use crate::config::{ConfigError, Settings};
use crate::store::{CredentialStore, InMemoryCredentialStore};

/// Application state shared across auth handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Credential records
    pub store: Arc<dyn CredentialStore>,
    /// Token signer, also used to verify tokens in tests and downstream checks
    pub issuer: Arc<TokenIssuer>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state backed by an in-memory store
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        Self::with_store(settings, Arc::new(InMemoryCredentialStore::new()))
    }

    /// Create a new application state over an existing store
    pub fn with_store(
        settings: Settings,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ConfigError> {
        let key = SigningKey::from_settings(&settings.auth)?;
        let issuer = Arc::new(TokenIssuer::new(&key));
        let hasher = CredentialHasher::new(&settings.auth.hash)?;

        let auth = DefaultAuth::new(store.clone(), issuer.clone(), hasher).map_err(|e| {
            ConfigError::Invalid {
                field: "auth.hash",
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            auth: Arc::new(auth),
            store,
            issuer,
            settings: Arc::new(settings),
        })
    }
}

// ============================
// crates/backend-lib/src/store.rs
// ============================
//! Credential storage abstraction with an in-memory implementation.
use std::fmt;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;

/// Errors reported by a credential store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("identity already registered: {0}")]
    AlreadyExists(String),

    #[error("identity not found")]
    NotFound,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// A PHC-encoded password hash (algorithm, cost, salt and digest).
///
/// `Debug` never prints the encoded value.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    pub fn new(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// Trait for credential backends
///
/// Implementations must make `insert` an atomic insert-if-absent: of any
/// number of concurrent inserts for one identity exactly one succeeds.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Register `identity`, failing with `AlreadyExists` if it is taken
    async fn insert(&self, identity: &str, hash: CredentialHash) -> Result<(), StoreError>;

    /// Fetch the stored hash for `identity`
    async fn lookup(&self, identity: &str) -> Result<CredentialHash, StoreError>;

    /// Number of registered identities
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Volatile store backed by a sharded concurrent map.
///
/// Records live as long as the process.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<String, CredentialHash>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert(&self, identity: &str, hash: CredentialHash) -> Result<(), StoreError> {
        // The entry guard holds the shard lock for this key until the match ends.
        match self.records.entry(identity.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(identity.to_owned())),
            Entry::Vacant(slot) => {
                slot.insert(hash);
                Ok(())
            },
        }
    }

    async fn lookup(&self, identity: &str) -> Result<CredentialHash, StoreError> {
        self.records
            .get(identity)
            .map(|record| record.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn len(&self) -> usize {
        self.records.len()
    }
}

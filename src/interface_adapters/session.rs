use std::sync::Arc;

use crate::domain::{StorageError, TokenStorage};
use crate::interface_adapters::storage::InMemoryTokenStorage;

// The single well-known storage key holding the session token.
pub const TOKEN_KEY: &str = "token";

// Single source of truth for the current credential. Cloning shares the same storage.
// Never performs network I/O.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTokenStorage::new()))
    }

    // Replace any stored token. The token is opaque and not validated.
    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.write(TOKEN_KEY, token)
    }

    // Current token, or None. Storage failures are logged and read as absent.
    pub fn token(&self) -> Option<String> {
        match self.storage.read(TOKEN_KEY) {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(%error, "failed to read session token; treating as signed out");
                None
            }
        }
    }

    // Idempotent: removing a missing token is a no-op.
    pub fn remove_token(&self) -> Result<(), StorageError> {
        self.storage.delete(TOKEN_KEY)
    }

    // Presence check only; says nothing about whether the backend still accepts the token.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

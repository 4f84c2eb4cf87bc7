//! Client-side session store.
//!
//! Two credential slots with two different lifetimes:
//!
//! - **Access token** - scoped to this storefront instance (one shell
//!   session, the equivalent of a browser tab). Memory only.
//! - **Refresh token** - persisted via [`DurableStore`], survives restarts.
//!   Never exchanged by this client.
//!
//! Plus a persisted username used purely as a display hint. Nothing here
//! proves authentication; only a successful profile load does that.

mod durable;

pub use durable::{DurableStore, SESSION_FILE_NAME, StorageError};

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use tracing::warn;

use range_core::{AccessToken, RefreshToken};

/// Session credential storage.
#[derive(Debug)]
pub struct SessionStore {
    access_token: RwLock<Option<AccessToken>>,
    durable: DurableStore,
}

impl SessionStore {
    /// A session store that keeps every slot in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_durable(DurableStore::in_memory())
    }

    /// Open a session store, persisting durable slots under `state_dir` when given.
    #[must_use]
    pub fn open(state_dir: Option<&Path>) -> Self {
        Self::with_durable(state_dir.map_or_else(DurableStore::in_memory, DurableStore::open))
    }

    const fn with_durable(durable: DurableStore) -> Self {
        Self {
            access_token: RwLock::new(None),
            durable,
        }
    }

    // =========================================================================
    // Access token (instance-scoped)
    // =========================================================================

    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the access token.
    pub fn set_access_token(&self, token: AccessToken) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Drop the access token.
    pub fn clear_access_token(&self) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    // =========================================================================
    // Refresh token (persisted)
    // =========================================================================

    /// Current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.durable.refresh_token()
    }

    /// Persist a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session file cannot be written.
    pub fn set_refresh_token(&self, token: RefreshToken) -> Result<(), StorageError> {
        self.durable.set_refresh_token(Some(token))
    }

    /// Remove the persisted refresh token.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session file cannot be written.
    pub fn clear_refresh_token(&self) -> Result<(), StorageError> {
        self.durable.set_refresh_token(None)
    }

    // =========================================================================
    // Username hint (persisted)
    // =========================================================================

    /// Cached username for display.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.durable.username()
    }

    /// Cache a username for display.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session file cannot be written.
    pub fn set_username(&self, username: &str) -> Result<(), StorageError> {
        self.durable.set_username(Some(username.to_owned()))
    }

    // =========================================================================
    // Lifecycle helpers
    // =========================================================================

    /// Store the credential pair issued at login.
    ///
    /// The access token is always installed. A failure to persist the
    /// refresh token is returned so the caller can report it, but the
    /// in-memory session stays usable.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the refresh token cannot be persisted.
    pub fn store_login(&self, access: AccessToken, refresh: RefreshToken) -> Result<(), StorageError> {
        self.set_access_token(access);
        self.set_refresh_token(refresh)
    }

    /// Remove both credentials. Never fails: the access token is always
    /// dropped and a persistence failure for the refresh token is logged.
    pub fn clear_credentials(&self) {
        self.clear_access_token();
        if let Err(e) = self.clear_refresh_token() {
            warn!(error = %e, "Failed to clear persisted refresh token");
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();

        let store = SessionStore::open(Some(dir.path()));
        store
            .store_login(AccessToken::new("T1"), RefreshToken::new("R1"))
            .unwrap();
        assert_eq!(store.access_token(), Some(AccessToken::new("T1")));
        drop(store);

        let next_tab = SessionStore::open(Some(dir.path()));
        assert!(next_tab.access_token().is_none());
        assert_eq!(next_tab.refresh_token(), Some(RefreshToken::new("R1")));
    }

    #[test]
    fn test_clear_credentials_keeps_username_hint() {
        let dir = tempfile::tempdir().unwrap();

        let store = SessionStore::open(Some(dir.path()));
        store
            .store_login(AccessToken::new("T1"), RefreshToken::new("R1"))
            .unwrap();
        store.set_username("a@b.com").unwrap();

        store.clear_credentials();
        store.clear_credentials();

        assert!(!store.has_access_token());
        assert!(store.refresh_token().is_none());
        assert_eq!(store.username().as_deref(), Some("a@b.com"));
    }
}

//! Persisted half of the session store.
//!
//! Survives restarts: one small JSON file holding the refresh token and the
//! cached username. Writes go through a temp file and a rename so a crash
//! never leaves a half-written session behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use range_core::RefreshToken;

/// File name of the persisted session inside the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Errors writing the persisted session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("session storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Session state could not be encoded.
    #[error("session storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted session fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DurableState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

/// Durable credential slots backed by a JSON file.
///
/// Without a path the slots live in memory only.
#[derive(Debug)]
pub struct DurableStore {
    path: Option<PathBuf>,
    state: RwLock<DurableState>,
}

impl DurableStore {
    /// A store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(DurableState::default()),
        }
    }

    /// Open the store in `dir`, loading any previously persisted session.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; the next write replaces it.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(SESSION_FILE_NAME);
        let state = load(&path);
        Self {
            path: Some(path),
            state: RwLock::new(state),
        }
    }

    /// Location of the session file, if persisted.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn refresh_token(&self) -> Option<RefreshToken> {
        self.read().refresh_token.clone()
    }

    pub(crate) fn username(&self) -> Option<String> {
        self.read().username.clone()
    }

    pub(crate) fn set_refresh_token(&self, token: Option<RefreshToken>) -> Result<(), StorageError> {
        self.update(|state| state.refresh_token = token)
    }

    pub(crate) fn set_username(&self, username: Option<String>) -> Result<(), StorageError> {
        self.update(|state| state.username = username)
    }

    /// Apply `change` and persist; memory is only updated once the write succeeds.
    fn update(&self, change: impl FnOnce(&mut DurableState)) -> Result<(), StorageError> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        change(&mut next);

        if let Some(path) = &self.path {
            persist(path, &next)?;
        }

        *guard = next;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DurableState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load(path: &Path) -> DurableState {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted session");
            return DurableState::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read persisted session");
            return DurableState::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Ignoring corrupt persisted session");
        DurableState::default()
    })
}

fn persist(path: &Path, state: &DurableState) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let body = serde_json::to_vec_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, body).map_err(io_err)?;

    // The refresh token is a bearer credential
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    fs::rename(&tmp, path).map_err(io_err)
}

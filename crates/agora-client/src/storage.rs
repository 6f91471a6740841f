//! Durable client-local state: the bearer token and the dark-mode flag.
//! Nothing else is persisted.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
struct StoredState {
    token: Option<String>,
    dark_mode: bool,
}

/// JSON-file-backed storage under the platform data directory.
///
/// A missing or corrupt file reads as empty state; a corrupt token simply
/// means the user logs in again.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    state: StoredState,
}

impl Storage {
    /// Open storage at the platform default location.
    pub fn open_default() -> Result<Self, StorageError> {
        let dirs = directories::ProjectDirs::from("", "", "agora")
            .ok_or(StorageError::NoDataDir)?;
        Self::open(dirs.data_dir().join("state.json"))
    }

    /// Open storage at an explicit path.
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        let state = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Corrupt state file, starting empty");
                StoredState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state })
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) -> Result<(), StorageError> {
        self.state.token = token;
        self.save()
    }

    pub fn dark_mode(&self) -> bool {
        self.state.dark_mode
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) -> Result<(), StorageError> {
        self.state.dark_mode = dark_mode;
        self.save()
    }

    fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // A struct of an Option<String> and a bool always serializes.
        let bytes = serde_json::to_vec_pretty(&self.state).unwrap_or_default();
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

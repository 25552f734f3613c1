//! File system paths for the tracking client.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the user's home for client runtime files.
const BASE_DIR_NAME: &str = ".beacon";

/// Manages file system paths for the tracking client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.beacon)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.beacon`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.beacon).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.beacon/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the install-state file path (~/.beacon/install.json).
    pub fn install_file(&self) -> PathBuf {
        self.base_dir.join("install.json")
    }

    /// Get the database file path (~/.beacon/beacon.sqlite).
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("beacon.sqlite")
    }

    /// Create the base directory if it does not exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

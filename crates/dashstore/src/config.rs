//! # Configuration
//!
//! Store configuration is managed by [`confique`], which handles layered loading
//! from TOML files and environment variables.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `DASHSTORE_DATA_DIR`, `DASHSTORE_BACKUP_DIR`,
//!    `DASHSTORE_LOCK_TIMEOUT_MS`.
//! 2. **Explicit file**: a TOML file passed by the caller (`--config`).
//! 3. **User file**: `dashstore.toml` in the OS-appropriate config directory
//!    (via the `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! Missing files are skipped.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | `data` | Directory holding one JSON file per collection |
//! | `backup_dir` | `backups` | Directory holding backup archives |
//! | `lock_timeout_ms` | `5000` | Max wait for a collection lock before `Conflict` |
//!
//! Relative directories are anchored with [`StoreConfig::resolve`].

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StoreError};

pub const CONFIG_FILE_NAME: &str = "dashstore.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one JSON file per collection.
    #[config(default = "data", env = "DASHSTORE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Directory holding timestamped backup archives.
    #[config(default = "backups", env = "DASHSTORE_BACKUP_DIR")]
    pub backup_dir: PathBuf,

    /// How long a mutation waits for its collection lock.
    #[config(default = 5000, env = "DASHSTORE_LOCK_TIMEOUT_MS")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backup_dir: PathBuf::from("backups"),
            lock_timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    /// Load env, then `explicit`, then the user config file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = StoreConfig::builder().env();
        if let Some(path) = explicit {
            builder = builder.file(path);
        }
        if let Some(path) = user_config_path() {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load from a single file (plus env), ignoring the user config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        StoreConfig::builder()
            .env()
            .file(path)
            .load()
            .map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Anchor relative directories on `base`.
    pub fn resolve(mut self, base: &Path) -> Self {
        if self.data_dir.is_relative() {
            self.data_dir = base.join(&self.data_dir);
        }
        if self.backup_dir.is_relative() {
            self.backup_dir = base.join(&self.backup_dir);
        }
        self
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// `<config_dir>/dashstore.toml` for the current user, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "dashstore", "dashstore")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_resolve_anchors_relative_dirs() {
        let config = StoreConfig::default().resolve(Path::new("/srv/dashboard"));
        assert_eq!(config.data_dir, PathBuf::from("/srv/dashboard/data"));
        assert_eq!(config.backup_dir, PathBuf::from("/srv/dashboard/backups"));
    }

    #[test]
    fn test_resolve_keeps_absolute_dirs() {
        let config = StoreConfig {
            data_dir: PathBuf::from("/var/lib/dash"),
            ..Default::default()
        }
        .resolve(Path::new("/srv"));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/dash"));
        assert_eq!(config.backup_dir, PathBuf::from("/srv/backups"));
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "backup_dir = \"snapshots\"\nlock_timeout_ms = 250\n").unwrap();

        let config = StoreConfig::from_file(&path).unwrap();

        assert_eq!(config.backup_dir, PathBuf::from("snapshots"));
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "lock_timeout_ms = \"soon\"\n").unwrap();

        let err = StoreConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}

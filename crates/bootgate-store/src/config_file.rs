// ABOUTME: Durable read and write of the gateway configuration document.
// ABOUTME: A missing file reads as an empty (unconfigured) snapshot; writes are atomic.

use std::path::{Path, PathBuf};

use bootgate_core::ConfigSnapshot;
use thiserror::Error;

use crate::fsutil::{read_optional, write_bytes_atomic};

/// Errors that can occur reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to the configuration file on disk.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current snapshot. Missing or blank files are the default snapshot.
    pub fn load(&self) -> Result<ConfigSnapshot, ConfigFileError> {
        match read_optional(&self.path)? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(ConfigSnapshot::default()),
        }
    }

    /// Replace the file with `config`.
    pub fn save(&self, config: &ConfigSnapshot) -> Result<(), ConfigFileError> {
        let json = serde_json::to_vec_pretty(config)?;
        write_bytes_atomic(&self.path, &json)?;
        Ok(())
    }
}

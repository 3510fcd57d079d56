// ABOUTME: Durable read and write of the versioned credential-profile store.
// ABOUTME: Exposes raw snapshot/restore so a failed commit can put the file back exactly as it was.

use std::path::{Path, PathBuf};

use bootgate_core::CredentialStore;
use thiserror::Error;

use crate::fsutil::{read_optional, read_optional_bytes, restore_bytes, write_bytes_atomic};

/// Errors that can occur reading or writing the credential store.
#[derive(Debug, Error)]
pub enum CredentialFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to the credential store file on disk.
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, or start an empty one at the current version if the
    /// file does not exist. A corrupt file is an error, never silently reset.
    pub fn load_or_init(&self) -> Result<CredentialStore, CredentialFileError> {
        match read_optional(&self.path)? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(CredentialStore::default()),
        }
    }

    pub fn save(&self, store: &CredentialStore) -> Result<(), CredentialFileError> {
        let json = serde_json::to_vec_pretty(store)?;
        write_bytes_atomic(&self.path, &json)?;
        Ok(())
    }

    /// Exact current bytes, or `None` if the file does not exist.
    pub fn read_raw(&self) -> Result<Option<Vec<u8>>, CredentialFileError> {
        Ok(read_optional_bytes(&self.path)?)
    }

    /// Return the file to a state captured by [`Self::read_raw`].
    pub fn restore_raw(&self, previous: Option<&[u8]>) -> std::io::Result<()> {
        restore_bytes(&self.path, previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootgate_core::{AUTH_STORE_VERSION, Credential, ProfileId};
    use tempfile::TempDir;

    #[test]
    fn missing_store_initializes_empty() {
        let dir = TempDir::new().unwrap();
        let file = CredentialFile::new(dir.path().join("auth-profiles.json"));

        let store = file.load_or_init().unwrap();

        assert_eq!(store.version, AUTH_STORE_VERSION);
        assert!(store.profiles.is_empty());
        assert!(!file.path().exists(), "loading must not create the file");
    }

    #[test]
    fn saved_store_reloads() {
        let dir = TempDir::new().unwrap();
        let file = CredentialFile::new(dir.path().join("auth-profiles.json"));

        let mut store = file.load_or_init().unwrap();
        store.upsert(
            ProfileId::default_for("openai"),
            Credential::ApiKey {
                provider: "openai".to_string(),
                key: "sk-1".to_string(),
            },
        );
        file.save(&store).unwrap();

        assert_eq!(file.load_or_init().unwrap(), store);
    }

    #[test]
    fn corrupt_store_is_not_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("auth-profiles.json");
        std::fs::write(&path, "garbage").unwrap();

        let file = CredentialFile::new(path.clone());
        assert!(matches!(file.load_or_init(), Err(CredentialFileError::Json(_))));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "garbage");
    }

    #[test]
    fn raw_snapshot_restores_previous_contents() {
        let dir = TempDir::new().unwrap();
        let file = CredentialFile::new(dir.path().join("auth-profiles.json"));
        std::fs::write(file.path(), b"{\"version\":1,\"profiles\":{}}").unwrap();

        let before = file.read_raw().unwrap();
        file.save(&CredentialStore::default()).unwrap();
        file.restore_raw(before.as_deref()).unwrap();

        assert_eq!(
            std::fs::read(file.path()).unwrap(),
            b"{\"version\":1,\"profiles\":{}}".to_vec()
        );
    }
}

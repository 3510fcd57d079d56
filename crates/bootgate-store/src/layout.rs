// ABOUTME: Filesystem layout of the gateway state directory.
// ABOUTME: Resolves config, credential store, OAuth, and per-agent session paths from one root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config_file::ConfigFile;
use crate::credential_file::CredentialFile;

pub const CONFIG_FILE_NAME: &str = "bootgate.json";
pub const CREDENTIALS_FILE_NAME: &str = "auth-profiles.json";
pub const OAUTH_FILE_PATH: &str = "credentials/oauth.json";
pub const AGENTS_DIR_NAME: &str = "agents";

/// Paths inside the state directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the state directory if it does not exist.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE_NAME)
    }

    pub fn oauth_path(&self) -> PathBuf {
        self.root.join(OAUTH_FILE_PATH)
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join(AGENTS_DIR_NAME)
    }

    /// `agents/<agent>/sessions`
    pub fn sessions_dir(&self, agent: &str) -> PathBuf {
        self.agents_dir().join(agent).join("sessions")
    }

    pub fn config_file(&self) -> ConfigFile {
        ConfigFile::new(self.config_path())
    }

    pub fn credential_file(&self) -> CredentialFile {
        CredentialFile::new(self.credentials_path())
    }
}

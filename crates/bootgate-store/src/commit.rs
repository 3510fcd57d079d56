// ABOUTME: The one-shot setup commit: credential store and configuration move together or not at all.
// ABOUTME: Commits are serialized process-wide and re-check configured state under the lock.

use bootgate_core::{ConfigSnapshot, ProfileId, ValidatedSetup, is_configured};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config_file::{ConfigFile, ConfigFileError};
use crate::credential_file::{CredentialFile, CredentialFileError};
use crate::layout::StateLayout;

/// Errors that can occur while committing a setup submission.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Setup has already been completed")]
    AlreadyConfigured,

    #[error("failed to read configuration: {0}")]
    ConfigRead(ConfigFileError),

    #[error("failed to write configuration: {0}")]
    ConfigWrite(ConfigFileError),

    #[error("failed to update credential store: {0}")]
    Credentials(#[from] CredentialFileError),

    #[error("failed to write configuration ({config}); restoring the credential store also failed: {rollback}")]
    RollbackFailed {
        config: ConfigFileError,
        rollback: std::io::Error,
    },
}

/// What a successful commit produced.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// The snapshot now on disk; callers publish it as the live configuration.
    pub config: ConfigSnapshot,
    pub profile_id: ProfileId,
}

/// Performs setup commits against one state directory, one at a time.
pub struct SetupCommitter {
    config_file: ConfigFile,
    credential_file: CredentialFile,
    lock: Mutex<()>,
}

impl SetupCommitter {
    pub fn new(layout: &StateLayout) -> Self {
        Self {
            config_file: layout.config_file(),
            credential_file: layout.credential_file(),
            lock: Mutex::new(()),
        }
    }

    /// Persist a validated setup submission.
    ///
    /// Sequence, all under the commit lock:
    /// 1. Reload the configuration from disk; refuse if it is already configured
    /// 2. Build the new configuration from the on-disk snapshot
    /// 3. Capture the credential store bytes, upsert the credential, save
    /// 4. Save the configuration; on failure put the credential store back
    ///
    /// The configuration is written last because it is what flips the gateway
    /// to "configured", so it must never land without its credential.
    pub async fn commit(&self, setup: &ValidatedSetup) -> Result<CommitReceipt, CommitError> {
        let _guard = self.lock.lock().await;

        let current = self.config_file.load().map_err(CommitError::ConfigRead)?;
        if is_configured(&current) {
            tracing::warn!("setup commit rejected: gateway is already configured");
            return Err(CommitError::AlreadyConfigured);
        }

        let next = setup.apply_to(&current);
        let profile_id = setup.profile_id();

        let previous_store = self.credential_file.read_raw()?;
        let mut store = self.credential_file.load_or_init()?;
        store.upsert(profile_id.clone(), setup.credential());
        self.credential_file.save(&store)?;

        if let Err(config_err) = self.config_file.save(&next) {
            tracing::error!(
                "config write failed after credential write, rolling back profile {}: {}",
                profile_id,
                config_err
            );
            return match self.credential_file.restore_raw(previous_store.as_deref()) {
                Ok(()) => Err(CommitError::ConfigWrite(config_err)),
                Err(rollback) => {
                    tracing::error!("credential store rollback failed: {}", rollback);
                    Err(CommitError::RollbackFailed {
                        config: config_err,
                        rollback,
                    })
                }
            };
        }

        tracing::info!(
            profile = %profile_id,
            provider = %setup.provider,
            channels = setup.channels.len(),
            "setup committed"
        );

        Ok(CommitReceipt {
            config: next,
            profile_id,
        })
    }
}

// ABOUTME: Persistence layer for bootgate: config and credential files under one state directory.
// ABOUTME: Provides atomic writes, the serialized setup commit with rollback, and the export builder.

pub mod commit;
pub mod config_file;
pub mod credential_file;
pub mod export;
pub mod fsutil;
pub mod layout;

pub use commit::{CommitError, CommitReceipt, SetupCommitter};
pub use config_file::{ConfigFile, ConfigFileError};
pub use credential_file::{CredentialFile, CredentialFileError};
pub use export::{ExportBundle, ExportError, TranscriptMeta, build_export};
pub use layout::StateLayout;

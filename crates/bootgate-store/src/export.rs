// ABOUTME: Builds the backup bundle served by the export endpoint from the state directory.
// ABOUTME: Best-effort per file; transcripts contribute only their count and file names.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::fsutil::read_optional;
use crate::layout::{AGENTS_DIR_NAME, CONFIG_FILE_NAME, CREDENTIALS_FILE_NAME, OAUTH_FILE_PATH, StateLayout};

const TRANSCRIPT_EXTENSION: &str = ".jsonl";

/// Errors that abort an export as a whole.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to scan {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },
}

/// The downloadable backup document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: String,
    pub files: BTreeMap<String, Value>,
}

/// Transcript summary recorded per agent instead of transcript contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMeta {
    pub transcript_count: usize,
    pub transcript_files: Vec<String>,
}

/// Gather config, credentials, OAuth credentials, and agent session stores.
///
/// Missing files are skipped. Unreadable individual files are logged and
/// skipped. Failing to enumerate the agents directory aborts the export so the
/// caller never ships a bundle that silently lost whole agents.
pub fn build_export(layout: &StateLayout, version: &str) -> Result<ExportBundle, ExportError> {
    let mut files = BTreeMap::new();

    include_file(&mut files, CONFIG_FILE_NAME, &layout.config_path());
    include_file(&mut files, CREDENTIALS_FILE_NAME, &layout.credentials_path());
    include_file(&mut files, OAUTH_FILE_PATH, &layout.oauth_path());

    for agent in list_agent_dirs(&layout.agents_dir())? {
        let sessions_dir = layout.sessions_dir(&agent);
        let prefix = format!("{AGENTS_DIR_NAME}/{agent}/sessions");

        include_file(
            &mut files,
            &format!("{prefix}/sessions.json"),
            &sessions_dir.join("sessions.json"),
        );

        match transcript_meta(&sessions_dir) {
            Ok(Some(meta)) => {
                files.insert(
                    format!("{prefix}/_meta"),
                    json!({
                        "transcriptCount": meta.transcript_count,
                        "transcriptFiles": meta.transcript_files,
                    }),
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("skipping transcript listing for agent {}: {}", agent, e);
            }
        }
    }

    tracing::info!(file_count = files.len(), "export assembled");

    Ok(ExportBundle {
        version: version.to_string(),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        files,
    })
}

/// Parse as JSON when possible, otherwise keep the raw text.
fn parse_lenient(contents: String) -> Value {
    serde_json::from_str(&contents).unwrap_or(Value::String(contents))
}

fn include_file(files: &mut BTreeMap<String, Value>, key: &str, path: &Path) {
    match read_optional(path) {
        Ok(Some(contents)) if !contents.is_empty() => {
            files.insert(key.to_string(), parse_lenient(contents));
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!("export skipping unreadable file {}: {}", path.display(), e);
        }
    }
}

/// Names of agent directories, sorted. A missing agents directory is empty.
fn list_agent_dirs(agents_dir: &Path) -> Result<Vec<String>, ExportError> {
    let scan_err = |source| ExportError::Scan {
        path: agents_dir.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(agents_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(scan_err(e)),
    };

    let mut agents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(scan_err)?;
        if entry.file_type().map_err(scan_err)?.is_dir() {
            agents.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    agents.sort();
    Ok(agents)
}

/// Count and list transcript files. `None` when the sessions directory is absent.
fn transcript_meta(sessions_dir: &Path) -> io::Result<Option<TranscriptMeta>> {
    let entries = match fs::read_dir(sessions_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut transcript_files = Vec::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.ends_with(TRANSCRIPT_EXTENSION) {
            transcript_files.push(name);
        }
    }
    transcript_files.sort();

    Ok(Some(TranscriptMeta {
        transcript_count: transcript_files.len(),
        transcript_files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn layout_in(dir: &TempDir) -> StateLayout {
        StateLayout::new(dir.path().to_path_buf())
    }

    #[test]
    fn empty_state_dir_exports_no_files() {
        let dir = TempDir::new().unwrap();

        let bundle = build_export(&layout_in(&dir), "1.2.3").unwrap();

        assert_eq!(bundle.version, "1.2.3");
        assert!(bundle.files.is_empty());
        assert!(bundle.exported_at.ends_with('Z'));
    }

    #[test]
    fn config_and_credentials_are_parsed() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        fs::write(layout.config_path(), r#"{"gateway":{"auth":{"mode":"password"}}}"#).unwrap();
        fs::write(layout.credentials_path(), r#"{"version":1,"profiles":{}}"#).unwrap();
        fs::create_dir_all(layout.oauth_path().parent().unwrap()).unwrap();
        fs::write(layout.oauth_path(), "not json at all").unwrap();

        let bundle = build_export(&layout, "0.1.0").unwrap();

        assert_eq!(bundle.files["bootgate.json"]["gateway"]["auth"]["mode"], "password");
        assert_eq!(bundle.files["auth-profiles.json"]["version"], 1);
        assert_eq!(bundle.files["credentials/oauth.json"], json!("not json at all"));
    }

    #[test]
    fn transcripts_are_listed_not_included() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        let sessions = layout.sessions_dir("main");
        fs::create_dir_all(&sessions).unwrap();
        fs::write(sessions.join("sessions.json"), r#"{"s1":{"updatedAt":1}}"#).unwrap();
        fs::write(sessions.join("b.jsonl"), "{\"role\":\"user\",\"content\":\"TOP SECRET\"}\n").unwrap();
        fs::write(sessions.join("a.jsonl"), "{\"role\":\"assistant\"}\n").unwrap();
        fs::write(sessions.join("notes.txt"), "ignored").unwrap();

        let bundle = build_export(&layout, "0.1.0").unwrap();

        assert_eq!(bundle.files["agents/main/sessions/sessions.json"]["s1"]["updatedAt"], 1);
        assert_eq!(
            bundle.files["agents/main/sessions/_meta"],
            json!({ "transcriptCount": 2, "transcriptFiles": ["a.jsonl", "b.jsonl"] })
        );
        let rendered = serde_json::to_string(&bundle).unwrap();
        assert!(!rendered.contains("TOP SECRET"));
    }

    #[test]
    fn agents_without_sessions_dir_get_no_meta() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        fs::create_dir_all(layout.agents_dir().join("idle")).unwrap();
        fs::write(layout.agents_dir().join("stray-file"), "x").unwrap();

        let bundle = build_export(&layout, "0.1.0").unwrap();

        assert!(bundle.files.is_empty());
    }

    #[test]
    fn unreadable_agents_dir_fails_export() {
        let dir = TempDir::new().unwrap();
        let layout = layout_in(&dir);
        // A regular file where the agents directory should be.
        fs::write(layout.agents_dir(), "not a directory").unwrap();

        let err = build_export(&layout, "0.1.0").unwrap_err();
        assert!(matches!(err, ExportError::Scan { .. }));
    }

    #[test]
    fn bundle_serializes_with_camel_case_keys() {
        let dir = TempDir::new().unwrap();
        let value = serde_json::to_value(build_export(&layout_in(&dir), "0.1.0").unwrap()).unwrap();

        assert!(value.get("exportedAt").is_some());
        assert!(value.get("files").is_some());
        assert_eq!(value["version"], "0.1.0");
    }
}

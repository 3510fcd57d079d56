// ABOUTME: Small filesystem primitives shared by the store: atomic writes and optional reads.
// ABOUTME: Writes go to a sibling .tmp file, are fsynced, then renamed over the target.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temp path used while writing `path`.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace `path` with `bytes` (write to .tmp, fsync, rename).
/// Creates parent directories. Files are created owner-readable only on unix.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(path);
    let mut file = open_private(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Read a UTF-8 file, mapping "does not exist" to `None`.
/// Every other error is returned so the caller decides whether it matters.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Byte-level variant of [`read_optional`], used to snapshot a file before mutating it.
pub fn read_optional_bytes(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Put a file back to a previously captured state: rewrite it, or delete it
/// if it did not exist.
pub fn restore_bytes(path: &Path, previous: Option<&[u8]>) -> io::Result<()> {
    match previous {
        Some(bytes) => write_bytes_atomic(path, bytes),
        None => match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_tmp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deep").join("nested").join("file.json");

        write_bytes_atomic(&path, b"{\"a\":1}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":1}");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn atomic_write_replaces_existing_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("file.json");

        write_bytes_atomic(&path, b"first").unwrap();
        write_bytes_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret.json");
        write_bytes_atomic(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn read_optional_maps_missing_to_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(&dir.path().join("absent.json")).unwrap().is_none());
        assert!(read_optional_bytes(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn read_optional_surfaces_other_errors() {
        let dir = TempDir::new().unwrap();
        // Reading a directory as a file is an error that is not "not found".
        assert!(read_optional(dir.path()).is_err());
    }

    #[test]
    fn restore_rewrites_or_deletes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        write_bytes_atomic(&path, b"new").unwrap();
        restore_bytes(&path, Some(b"old")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");

        restore_bytes(&path, None).unwrap();
        assert!(!path.exists());

        // Deleting an already-absent file is fine.
        restore_bytes(&path, None).unwrap();
    }
}

use std::fs;
use std::path::Path;

use crate::vault::error::{VaultError, VaultResult};

/// Low-level file operations for vault content.
///
/// Immutability is the platform read-only flag: strong enough to stop
/// accidental edits by CAD hosts and scripts, not a security boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Copies `source` over `destination`, overwriting anything there.
    ///
    /// The destination's parent directories are created as needed, and a
    /// stale read-only flag on an existing destination is cleared first so
    /// that overwriting a previously locked file cannot fail halfway.
    /// Returns the number of bytes copied.
    pub fn copy(&self, source: &Path, destination: &Path) -> VaultResult<u64> {
        if !source.exists() {
            return Err(VaultError::NotFound {
                path: source.to_path_buf(),
            });
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VaultError::io(format!("creating {}", parent.display()), e))?;
        }
        if destination.exists() {
            self.set_immutable(destination, false)?;
        }
        fs::copy(source, destination).map_err(|e| {
            VaultError::io(
                format!("copying {} to {}", source.display(), destination.display()),
                e,
            )
        })
    }

    /// Sets or clears the read-only flag. Fails with `NotFound` if the
    /// file does not exist.
    pub fn set_immutable(&self, path: &Path, immutable: bool) -> VaultResult<()> {
        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                VaultError::io(format!("reading metadata of {}", path.display()), e)
            }
        })?;
        let mut permissions = metadata.permissions();
        permissions.set_readonly(immutable);
        fs::set_permissions(path, permissions)
            .map_err(|e| VaultError::io(format!("setting permissions on {}", path.display()), e))
    }

    /// Whether the file currently carries the read-only flag. A missing
    /// file reports `false`.
    pub fn is_immutable(&self, path: &Path) -> bool {
        fs::metadata(path)
            .map(|m| m.permissions().readonly())
            .unwrap_or(false)
    }

    /// File size in bytes. A missing file reports `0`.
    pub fn size(&self, path: &Path) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_creates_parents_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "payload").unwrap();
        let destination = dir.path().join("nested/deep/b.txt");

        let store = FileStore;
        let bytes = store.copy(&source, &destination).unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "payload");
    }

    #[test]
    fn copy_overwrites_a_read_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let destination = dir.path().join("b.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "old").unwrap();

        let store = FileStore;
        store.set_immutable(&destination, true).unwrap();
        store.copy(&source, &destination).unwrap();
        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn copy_fails_when_source_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore;
        let err = store
            .copy(&dir.path().join("ghost.txt"), &dir.path().join("b.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn immutability_toggles_and_missing_files_report_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let store = FileStore;
        assert!(!store.is_immutable(&file));
        store.set_immutable(&file, true).unwrap();
        assert!(store.is_immutable(&file));
        store.set_immutable(&file, false).unwrap();
        assert!(!store.is_immutable(&file));

        let ghost = dir.path().join("ghost.txt");
        assert!(!store.is_immutable(&ghost));
        assert_eq!(store.size(&ghost), 0);
        assert_eq!(store.set_immutable(&ghost, true).unwrap_err().kind(), "not_found");
    }
}

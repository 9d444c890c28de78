use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use fs2::FileExt;
use serde::Serialize;
use uuid::Uuid;

use crate::vault::error::{VaultError, VaultResult};
use crate::vault::layout::PartPaths;

/// Diagnostics written into the lock file by the current holder.
/// Purely informational; the OS-level lock is what serializes writers.
#[derive(Debug, Serialize)]
struct LockHolder {
    token: Uuid,
    pid: u32,
    host: String,
    acquired_at: chrono::DateTime<chrono::Utc>,
}

/// Exclusive advisory lock over one part's transitions.
///
/// Freeze, release, and rework all acquire this before touching the part
/// folder, which serializes writers across processes (and across threads
/// within one process, since the lock is held per open file). The lock is
/// released when the guard drops; the `part.lock` file itself is left in
/// place and is ignored by scans.
#[derive(Debug)]
pub struct PartLock {
    file: File,
    part: String,
    path: PathBuf,
}

impl PartLock {
    /// Tries to take the part's lock, retrying `retries` times with
    /// `pause` between attempts before giving up with
    /// [`VaultError::ConcurrencyConflict`].
    pub fn acquire(paths: &PartPaths, retries: u32, pause: Duration) -> VaultResult<Self> {
        let folder = paths.part_folder();
        fs::create_dir_all(&folder)
            .map_err(|e| VaultError::io(format!("creating {}", folder.display()), e))?;

        let path = paths.lock_file();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| VaultError::io(format!("opening {}", path.display()), e))?;

        let mut attempt = 0u32;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if is_contended(&e) => {
                    if attempt >= retries {
                        tracing::warn!(
                            part = paths.file_stem(),
                            attempts = attempt + 1,
                            "giving up on contended part lock"
                        );
                        return Err(VaultError::ConcurrencyConflict {
                            part: paths.file_stem().to_string(),
                        });
                    }
                    if attempt == 0 {
                        tracing::debug!(part = paths.file_stem(), "part lock contended, retrying");
                    }
                    attempt += 1;
                    std::thread::sleep(pause);
                }
                Err(e) => {
                    return Err(VaultError::io(format!("locking {}", path.display()), e));
                }
            }
        }

        let lock = Self {
            file,
            part: paths.file_stem().to_string(),
            path,
        };
        lock.write_holder();
        Ok(lock)
    }

    /// Records who holds the lock, for operators inspecting a stuck vault.
    fn write_holder(&self) {
        let holder = LockHolder {
            token: Uuid::new_v4(),
            pid: std::process::id(),
            host: whoami::fallible::hostname().unwrap_or_else(|_| "unknown".into()),
            acquired_at: chrono::Utc::now(),
        };
        let result = self
            .file
            .set_len(0)
            .and_then(|_| {
                let json = serde_json::to_vec_pretty(&holder).unwrap_or_default();
                (&self.file).write_all(&json)
            })
            .and_then(|_| (&self.file).flush());
        if let Err(e) = result {
            tracing::warn!(part = %self.part, error = %e, "could not record lock holder");
        }
    }

    pub fn part(&self) -> &str {
        &self.part
    }
}

impl Drop for PartLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            tracing::warn!(
                part = %self.part,
                path = %self.path.display(),
                error = %e,
                "failed to release part lock"
            );
        }
    }
}

fn is_contended(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn paths_for(dir: &Path) -> PartPaths {
        PartPaths::resolve(dir, "Bracket.SLDPRT").unwrap()
    }

    #[test]
    fn second_acquire_conflicts_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_for(dir.path());

        let held = PartLock::acquire(&paths, 0, Duration::from_millis(1)).unwrap();
        assert_eq!(held.part(), "Bracket");

        let err = PartLock::acquire(&paths, 2, Duration::from_millis(1)).unwrap_err();
        assert_eq!(err.kind(), "concurrency_conflict");
    }

    #[test]
    fn lock_is_reacquirable_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_for(dir.path());

        let held = PartLock::acquire(&paths, 0, Duration::from_millis(1)).unwrap();
        drop(held);
        PartLock::acquire(&paths, 0, Duration::from_millis(1)).unwrap();
    }

    #[test]
    fn lock_file_records_the_holder() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_for(dir.path());

        let _held = PartLock::acquire(&paths, 0, Duration::from_millis(1)).unwrap();
        let raw = fs::read_to_string(paths.lock_file()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["pid"], std::process::id());
        assert!(json["token"].is_string());
    }
}

//! The vault engine: version snapshots and lifecycle state for design
//! files, with the filesystem as the only system of record.
//!
//! A project root contains `Working/` (editable copies) and `Parts/`
//! (immutable history plus per-part lifecycle documents). [`Vault`] is
//! the single entry point: it resolves paths, takes the per-part
//! transition lock, and dispatches to the managers underneath.

mod error;
mod file_store;
mod layout;
mod lifecycle;
mod lock;
mod metadata;
mod versions;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{PartState, PartSummary, VersionId, VersionRecord};

pub use error::{VaultError, VaultResult};
pub use file_store::FileStore;
pub use layout::{PartPaths, PARTS_DIR, PART_LOCK_FILE, PART_META_FILE, VERSION_META_FILE, WORKING_DIR};
pub use lifecycle::LifecycleManager;
pub use lock::PartLock;
pub use metadata::MetadataStore;
pub use versions::VersionManager;

/// Tunables for a [`Vault`].
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Retries before a contended part lock becomes a conflict error.
    pub lock_retries: u32,
    /// Pause between lock attempts.
    pub lock_retry_pause: Duration,
    /// Author recorded on snapshots when the caller does not name one.
    pub default_author: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            lock_retries: 50,
            lock_retry_pause: Duration::from_millis(100),
            default_author: whoami::username(),
        }
    }
}

/// Facade over the vault engine.
///
/// Every mutating operation resolves the part's paths, acquires the
/// part's transition lock, and only then touches the tree, so transitions
/// on one part are serialized even across processes. Reads are lock-free.
#[derive(Debug, Clone, Default)]
pub struct Vault {
    config: Arc<VaultConfig>,
    files: FileStore,
    versions: VersionManager,
    lifecycle: LifecycleManager,
}

impl Vault {
    pub fn new(config: VaultConfig) -> Self {
        let files = FileStore;
        let meta = MetadataStore;
        let versions = VersionManager::new(files, meta);
        Self {
            config: Arc::new(config),
            files,
            versions,
            lifecycle: LifecycleManager::new(files, meta, versions),
        }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Takes the part's transition lock explicitly. Useful for callers
    /// composing several operations into one critical section.
    pub fn lock_part(&self, project_root: &Path, file_name: &str) -> VaultResult<PartLock> {
        let paths = self.paths(project_root, file_name)?;
        self.acquire(&paths)
    }

    // ============================================================
    // Project operations
    // ============================================================

    /// Creates the `Working/` and `Parts/` folders under the project
    /// root. Idempotent.
    pub fn init_project(&self, project_root: &Path) -> VaultResult<()> {
        for dir in [WORKING_DIR, PARTS_DIR] {
            let path = project_root.join(dir);
            fs::create_dir_all(&path)
                .map_err(|e| VaultError::io(format!("creating {}", path.display()), e))?;
        }
        tracing::info!(root = %project_root.display(), "initialized vault project");
        Ok(())
    }

    /// All tracked parts under the project root, sorted by name.
    ///
    /// A part whose lifecycle document cannot be read is reported with
    /// state `Unknown` instead of failing the listing.
    pub fn list_parts(&self, project_root: &Path) -> VaultResult<Vec<PartSummary>> {
        let parts_dir = project_root.join(PARTS_DIR);
        if !parts_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&parts_dir)
            .map_err(|e| VaultError::io(format!("listing {}", parts_dir.display()), e))?;

        let meta = MetadataStore;
        let mut parts = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| VaultError::io(format!("listing {}", parts_dir.display()), e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let folder = entry.path();
            match meta.load_part(&folder) {
                Ok(Some(record)) => parts.push(PartSummary {
                    name,
                    state: record.state,
                    latest_version: record.latest_version,
                    released_version: record.released_version,
                }),
                Ok(None) => {
                    // No lifecycle document. Folders that also hold no
                    // versions are not parts at all.
                    match self.versions.latest_in(&folder)? {
                        Some(latest) => parts.push(PartSummary {
                            name,
                            state: PartState::Working,
                            latest_version: latest.to_string(),
                            released_version: None,
                        }),
                        None => continue,
                    }
                }
                Err(e) => {
                    tracing::warn!(part = %name, error = %e, "part metadata unreadable");
                    let latest = self.versions.latest_in(&folder)?.unwrap_or(VersionId::NONE);
                    parts.push(PartSummary {
                        name,
                        state: PartState::Unknown,
                        latest_version: latest.to_string(),
                        released_version: None,
                    });
                }
            }
        }
        parts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parts)
    }

    // ============================================================
    // Version operations
    // ============================================================

    /// Snapshots the working copy as the part's next version.
    pub fn create_version(
        &self,
        project_root: &Path,
        file_name: &str,
        author: Option<&str>,
        change_note: &str,
    ) -> VaultResult<VersionRecord> {
        let paths = self.paths(project_root, file_name)?;
        let _lock = self.acquire(&paths)?;
        let author = author.unwrap_or(&self.config.default_author);
        self.versions.create_version(&paths, author, change_note)
    }

    /// All snapshots of the part, oldest first. Empty for an untracked part.
    pub fn version_history(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> VaultResult<Vec<VersionRecord>> {
        let paths = self.paths(project_root, file_name)?;
        self.versions.version_history(&paths)
    }

    /// Latest version identifier on disk, or `v000` if none exist.
    pub fn latest_version(&self, project_root: &Path, file_name: &str) -> VaultResult<VersionId> {
        let paths = self.paths(project_root, file_name)?;
        Ok(self
            .versions
            .latest_on_disk(&paths)?
            .unwrap_or(VersionId::NONE))
    }

    // ============================================================
    // Lifecycle transitions
    // ============================================================

    /// Freeze: snapshot the working copy and move the part to `Frozen`.
    pub fn freeze(
        &self,
        project_root: &Path,
        file_name: &str,
        author: Option<&str>,
        change_note: &str,
    ) -> VaultResult<VersionRecord> {
        let paths = self.paths(project_root, file_name)?;
        let _lock = self.acquire(&paths)?;
        let author = author.unwrap_or(&self.config.default_author);
        self.lifecycle.freeze(&paths, author, change_note)
    }

    /// Release: mark an existing snapshot as the approved revision.
    pub fn release(&self, project_root: &Path, file_name: &str, version: &str) -> VaultResult<()> {
        let paths = self.paths(project_root, file_name)?;
        let id = self.parse_version(&paths, version)?;
        let _lock = self.acquire(&paths)?;
        self.lifecycle.release(&paths, id)
    }

    /// Rework: restore a snapshot into the working copy and return the
    /// part to `Working`.
    pub fn rework(&self, project_root: &Path, file_name: &str, version: &str) -> VaultResult<()> {
        let paths = self.paths(project_root, file_name)?;
        let id = self.parse_version(&paths, version)?;
        let _lock = self.acquire(&paths)?;
        self.lifecycle.rework(&paths, id)
    }

    // ============================================================
    // State queries
    // ============================================================

    /// The part's lifecycle state: `Working` when untracked, `Unknown`
    /// when its lifecycle document is unreadable.
    pub fn part_state(&self, project_root: &Path, file_name: &str) -> VaultResult<PartState> {
        let paths = self.paths(project_root, file_name)?;
        Ok(self.lifecycle.part_state(&paths))
    }

    /// Lifecycle summary of one part, in the same shape as a listing row.
    pub fn part_summary(&self, project_root: &Path, file_name: &str) -> VaultResult<PartSummary> {
        let paths = self.paths(project_root, file_name)?;
        let meta = MetadataStore;
        let summary = match meta.load_part(&paths.part_folder()) {
            Ok(Some(record)) => PartSummary {
                name: paths.file_stem().to_string(),
                state: record.state,
                latest_version: record.latest_version,
                released_version: record.released_version,
            },
            Ok(None) => PartSummary {
                name: paths.file_stem().to_string(),
                state: PartState::Working,
                latest_version: self
                    .versions
                    .latest_on_disk(&paths)?
                    .unwrap_or(VersionId::NONE)
                    .to_string(),
                released_version: None,
            },
            Err(e) => {
                tracing::warn!(part = paths.file_stem(), error = %e, "part metadata unreadable");
                PartSummary {
                    name: paths.file_stem().to_string(),
                    state: PartState::Unknown,
                    latest_version: self
                        .versions
                        .latest_on_disk(&paths)?
                        .unwrap_or(VersionId::NONE)
                        .to_string(),
                    released_version: None,
                }
            }
        };
        Ok(summary)
    }

    /// Whether the part's working copy currently carries the read-only flag.
    pub fn working_copy_locked(&self, project_root: &Path, file_name: &str) -> VaultResult<bool> {
        let paths = self.paths(project_root, file_name)?;
        Ok(self.files.is_immutable(&paths.working_file()))
    }

    // ============================================================
    // Internals
    // ============================================================

    fn paths(&self, project_root: &Path, file_name: &str) -> VaultResult<PartPaths> {
        PartPaths::resolve(project_root, file_name)
    }

    fn acquire(&self, paths: &PartPaths) -> VaultResult<PartLock> {
        PartLock::acquire(paths, self.config.lock_retries, self.config.lock_retry_pause)
    }

    fn parse_version(&self, paths: &PartPaths, version: &str) -> VaultResult<VersionId> {
        VersionId::parse(version).ok_or_else(|| VaultError::VersionNotFound {
            part: paths.file_stem().to_string(),
            version: version.to_string(),
        })
    }
}

use crate::models::{PartRecord, PartState, VersionId, VersionRecord};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::file_store::FileStore;
use crate::vault::layout::PartPaths;
use crate::vault::metadata::MetadataStore;
use crate::vault::versions::VersionManager;

/// Drives parts through the Working / Frozen / Released lifecycle.
///
/// Transitions order their filesystem effects so the lifecycle document
/// is committed last: if anything before that commit fails, the part is
/// still in its previous valid state.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleManager {
    files: FileStore,
    meta: MetadataStore,
    versions: VersionManager,
}

impl LifecycleManager {
    pub fn new(files: FileStore, meta: MetadataStore, versions: VersionManager) -> Self {
        Self {
            files,
            meta,
            versions,
        }
    }

    /// Freeze: snapshot the working copy as the next version.
    ///
    /// Legal from any state; freezing a released part starts the next
    /// revision without disturbing the released snapshot. Callers must
    /// hold the part's transition lock.
    pub(crate) fn freeze(
        &self,
        paths: &PartPaths,
        author: &str,
        change_note: &str,
    ) -> VaultResult<VersionRecord> {
        self.versions.create_version(paths, author, change_note)
    }

    /// Release: mark one existing snapshot as the approved revision.
    ///
    /// The version's folder must exist and the part must already have a
    /// lifecycle document (i.e. it has been frozen at least once).
    /// Releasing an older version than the current release is allowed and
    /// logged as a downgrade. Callers must hold the part's transition lock.
    pub(crate) fn release(&self, paths: &PartPaths, version: VersionId) -> VaultResult<()> {
        if !paths.version_folder(version).exists() {
            return Err(VaultError::VersionNotFound {
                part: paths.file_stem().to_string(),
                version: version.to_string(),
            });
        }
        let record = self.meta.load_part(&paths.part_folder())?.ok_or_else(|| {
            VaultError::InvalidTransition {
                part: paths.file_stem().to_string(),
                reason: "part has no lifecycle document, freeze it first".to_string(),
            }
        })?;

        if let Some(current) = record.released_id() {
            if version < current {
                tracing::warn!(
                    part = paths.file_stem(),
                    from = %current,
                    to = %version,
                    "downgrading released version"
                );
            }
        }

        // Content first: re-assert the read-only flag on the snapshot,
        // then commit the lifecycle document.
        let version_file = paths.version_file(version);
        if version_file.exists() {
            self.files.set_immutable(&version_file, true)?;
        } else {
            tracing::warn!(
                part = paths.file_stem(),
                version = %version,
                "released version folder has no content file"
            );
        }

        let updated = PartRecord {
            latest_version: record.latest_version,
            released_version: Some(version.to_string()),
            state: PartState::Released,
        };
        self.meta.save_part(&paths.part_folder(), &updated)?;

        tracing::info!(part = paths.file_stem(), version = %version, "released version");
        Ok(())
    }

    /// Rework: copy a snapshot back over the working copy and return the
    /// part to `Working`.
    ///
    /// The snapshot stays locked and untouched; only the working copy
    /// changes. The recorded latest and released versions are preserved.
    /// Callers must hold the part's transition lock.
    pub(crate) fn rework(&self, paths: &PartPaths, version: VersionId) -> VaultResult<()> {
        let version_file = paths.version_file(version);
        if !version_file.exists() {
            return Err(VaultError::VersionNotFound {
                part: paths.file_stem().to_string(),
                version: version.to_string(),
            });
        }

        // Reconstruct the lifecycle document from disk if it is missing;
        // the version folders are the system of record.
        let record = match self.meta.load_part(&paths.part_folder())? {
            Some(record) => record,
            None => {
                let latest = self
                    .versions
                    .latest_on_disk(paths)?
                    .unwrap_or(VersionId::NONE);
                PartRecord {
                    latest_version: latest.to_string(),
                    released_version: None,
                    state: PartState::Working,
                }
            }
        };

        let working = paths.working_file();
        self.files.copy(&version_file, &working)?;
        // The copy inherits the snapshot's read-only flag; the working
        // copy must be editable again.
        self.files.set_immutable(&working, false)?;

        let updated = PartRecord {
            latest_version: record.latest_version,
            released_version: record.released_version,
            state: PartState::Working,
        };
        self.meta.save_part(&paths.part_folder(), &updated)?;

        tracing::info!(part = paths.file_stem(), version = %version, "reworked version into working copy");
        Ok(())
    }

    /// Current lifecycle state of the part.
    ///
    /// Never fails: a part without a lifecycle document is `Working`, and
    /// one whose document cannot be read reports `Unknown`.
    pub fn part_state(&self, paths: &PartPaths) -> PartState {
        match self.meta.load_part(&paths.part_folder()) {
            Ok(Some(record)) => record.state,
            Ok(None) => PartState::Working,
            Err(e) => {
                tracing::warn!(
                    part = paths.file_stem(),
                    error = %e,
                    "part state unreadable"
                );
                PartState::Unknown
            }
        }
    }
}

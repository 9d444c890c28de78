use std::fs;
use std::path::Path;

use crate::models::{PartRecord, PartState, VersionId, VersionRecord};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::file_store::FileStore;
use crate::vault::layout::PartPaths;
use crate::vault::metadata::MetadataStore;

/// Creates and inspects version snapshots.
///
/// Snapshot creation is ordered so that a crash at any point leaves the
/// vault valid: content is copied first, then locked, then the provenance
/// document is written, and the part's lifecycle document is committed
/// last. A folder abandoned halfway is skipped by history and stepped
/// over by numbering, never overwritten.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionManager {
    files: FileStore,
    meta: MetadataStore,
}

impl VersionManager {
    pub fn new(files: FileStore, meta: MetadataStore) -> Self {
        Self { files, meta }
    }

    /// Snapshots the working copy into the next version folder.
    ///
    /// Callers must hold the part's transition lock.
    pub(crate) fn create_version(
        &self,
        paths: &PartPaths,
        author: &str,
        change_note: &str,
    ) -> VaultResult<VersionRecord> {
        let working = paths.working_file();
        if !working.exists() {
            return Err(VaultError::WorkingFileMissing {
                file_name: paths.file_name().to_string(),
                path: working,
            });
        }

        let record = self.meta.load_part(&paths.part_folder())?;
        let version = self.next_version_id(record.as_ref(), paths)?;
        let version_file = paths.version_file(version);

        let file_size = self.files.copy(&working, &version_file)?;
        self.files.set_immutable(&version_file, true)?;
        let meta = self
            .meta
            .save_version(&paths.version_folder(version), version, author, change_note)?;

        let updated = PartRecord {
            latest_version: version.to_string(),
            released_version: record.and_then(|r| r.released_version),
            state: PartState::Frozen,
        };
        self.meta.save_part(&paths.part_folder(), &updated)?;

        tracing::info!(
            part = paths.file_stem(),
            version = %version,
            author,
            file_size,
            "created version snapshot"
        );

        Ok(VersionRecord {
            version,
            file_name: paths.file_name().to_string(),
            author: meta.created_by,
            created_at: meta.created_timestamp,
            change_note: meta.change_note,
            locked: self.files.is_immutable(&version_file),
            file_size,
            file_path: version_file,
        })
    }

    /// All snapshots of the part, oldest first.
    ///
    /// Folders whose names are not version identifiers are ignored. A
    /// version folder without a provenance document is the residue of an
    /// interrupted snapshot; it is logged and skipped rather than failing
    /// the whole history.
    pub fn version_history(&self, paths: &PartPaths) -> VaultResult<Vec<VersionRecord>> {
        let mut ids = self.version_ids_on_disk(paths)?;
        ids.sort();

        let mut history = Vec::with_capacity(ids.len());
        for id in ids {
            let folder = paths.version_folder(id);
            if !paths.version_meta(id).exists() {
                tracing::warn!(
                    part = paths.file_stem(),
                    version = %id,
                    "version folder has no provenance document, skipping"
                );
                continue;
            }
            let meta = self.meta.load_version(&folder)?;
            if meta.version != id {
                tracing::warn!(
                    part = paths.file_stem(),
                    folder = %id,
                    document = %meta.version,
                    "version document disagrees with its folder name"
                );
            }
            let file_path = paths.version_file(id);
            history.push(VersionRecord {
                version: id,
                file_name: paths.file_name().to_string(),
                author: meta.created_by,
                created_at: meta.created_timestamp,
                change_note: meta.change_note,
                file_size: self.files.size(&file_path),
                locked: self.files.is_immutable(&file_path),
                file_path,
            });
        }
        Ok(history)
    }

    /// Highest version identifier present on disk, from folder names alone.
    pub fn latest_on_disk(&self, paths: &PartPaths) -> VaultResult<Option<VersionId>> {
        self.latest_in(&paths.part_folder())
    }

    /// Like [`latest_on_disk`](Self::latest_on_disk) but for a bare part
    /// folder path, for callers walking `Parts/` directly.
    pub fn latest_in(&self, part_folder: &Path) -> VaultResult<Option<VersionId>> {
        Ok(self.version_ids_in(part_folder)?.into_iter().max())
    }

    fn version_ids_on_disk(&self, paths: &PartPaths) -> VaultResult<Vec<VersionId>> {
        self.version_ids_in(&paths.part_folder())
    }

    fn version_ids_in(&self, folder: &Path) -> VaultResult<Vec<VersionId>> {
        if !folder.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&folder)
            .map_err(|e| VaultError::io(format!("listing {}", folder.display()), e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| VaultError::io(format!("listing {}", folder.display()), e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| VaultError::io(format!("inspecting {}", folder.display()), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(VersionId::parse) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Next identifier to assign: one past the highest of the recorded
    /// latest version and anything found on disk.
    ///
    /// Taking the disk scan into account makes numbering self-healing: a
    /// deleted or stale lifecycle document can restart the count at worst,
    /// never reuse an identifier that still has a folder.
    fn next_version_id(
        &self,
        record: Option<&PartRecord>,
        paths: &PartPaths,
    ) -> VaultResult<VersionId> {
        let recorded = record.and_then(PartRecord::latest_id);
        let on_disk = self.latest_on_disk(paths)?;
        Ok(recorded
            .max(on_disk)
            .map(VersionId::next)
            .unwrap_or_else(VersionId::first))
    }
}

use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::models::{PartRecord, PartState, VersionId, VersionMeta};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::layout::{PART_META_FILE, VERSION_META_FILE};

/// Reads and writes the vault's JSON metadata documents.
///
/// Writes go through a temp file in the target directory followed by a
/// rename, so readers never observe a half-written document.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataStore;

impl MetadataStore {
    /// Loads the part's lifecycle document.
    ///
    /// A missing document is `Ok(None)`: the part has simply never been
    /// frozen. A document that exists but does not parse is an error;
    /// callers decide whether that is fatal for their operation.
    pub fn load_part(&self, part_folder: &Path) -> VaultResult<Option<PartRecord>> {
        let path = part_folder.join(PART_META_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(VaultError::io(format!("reading {}", path.display()), e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| VaultError::CorruptMetadata { path, source })
    }

    pub fn save_part(&self, part_folder: &Path, record: &PartRecord) -> VaultResult<()> {
        fs::create_dir_all(part_folder)
            .map_err(|e| VaultError::io(format!("creating {}", part_folder.display()), e))?;
        write_json(&part_folder.join(PART_META_FILE), record)
    }

    /// Writes the provenance document for a freshly created snapshot and
    /// returns it. The document is written once; nothing ever updates it.
    pub fn save_version(
        &self,
        version_folder: &Path,
        version: VersionId,
        author: &str,
        change_note: &str,
    ) -> VaultResult<VersionMeta> {
        let meta = VersionMeta {
            version,
            created_by: author.to_string(),
            created_timestamp: Utc::now(),
            change_note: change_note.to_string(),
            state: PartState::Frozen,
        };
        fs::create_dir_all(version_folder)
            .map_err(|e| VaultError::io(format!("creating {}", version_folder.display()), e))?;
        write_json(&version_folder.join(VERSION_META_FILE), &meta)?;
        Ok(meta)
    }

    pub fn load_version(&self, version_folder: &Path) -> VaultResult<VersionMeta> {
        let path = version_folder.join(VERSION_META_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VaultError::NotFound { path })
            }
            Err(e) => return Err(VaultError::io(format!("reading {}", path.display()), e)),
        };
        serde_json::from_str(&raw).map_err(|source| VaultError::CorruptMetadata { path, source })
    }
}

/// Serializes `value` to `path` via a sibling temp file and rename.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> VaultResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| VaultError::io(format!("encoding {}", path.display()), e.into()))?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, json).map_err(|e| VaultError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(tmp, path).map_err(|e| {
        VaultError::io(
            format!("renaming {} to {}", tmp.display(), path.display()),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_record_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore;
        let record = PartRecord {
            latest_version: "v003".into(),
            released_version: Some("v002".into()),
            state: PartState::Released,
        };

        store.save_part(dir.path(), &record).unwrap();
        let loaded = store.load_part(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.latest_version, "v003");
        assert_eq!(loaded.released_version.as_deref(), Some("v002"));
        assert_eq!(loaded.state, PartState::Released);
    }

    #[test]
    fn missing_part_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MetadataStore.load_part(dir.path()).unwrap().is_none());
    }

    #[test]
    fn unparseable_part_record_is_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PART_META_FILE), "{ nope").unwrap();
        let err = MetadataStore.load_part(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "corrupt_metadata");
    }

    #[test]
    fn version_meta_is_written_frozen_with_utc_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetadataStore;
        let id = VersionId::parse("v001").unwrap();

        let written = store
            .save_version(dir.path(), id, "mallory", "initial geometry")
            .unwrap();
        assert_eq!(written.state, PartState::Frozen);

        let loaded = store.load_version(dir.path()).unwrap();
        assert_eq!(loaded.version, id);
        assert_eq!(loaded.created_by, "mallory");
        assert_eq!(loaded.change_note, "initial geometry");
        assert_eq!(loaded.state, PartState::Frozen);

        let raw = fs::read_to_string(dir.path().join(VERSION_META_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let stamp = json["created_timestamp"].as_str().unwrap();
        assert!(stamp.ends_with('Z') || stamp.contains("+00:00"), "{stamp}");
    }

    #[test]
    fn writes_leave_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let record = PartRecord {
            latest_version: "v001".into(),
            released_version: None,
            state: PartState::Frozen,
        };
        MetadataStore.save_part(dir.path(), &record).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![PART_META_FILE.to_string()]);
    }
}

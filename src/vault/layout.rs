use std::path::{Path, PathBuf};

use crate::models::VersionId;
use crate::vault::error::{VaultError, VaultResult};

/// Directory holding the editable copies of tracked files.
pub const WORKING_DIR: &str = "Working";
/// Directory holding one folder per tracked part.
pub const PARTS_DIR: &str = "Parts";
/// Per-part lifecycle document inside the part folder.
pub const PART_META_FILE: &str = "part_meta.json";
/// Per-snapshot provenance document inside each version folder.
pub const VERSION_META_FILE: &str = "version_meta.json";
/// Advisory lock file guarding a part's transitions.
pub const PART_LOCK_FILE: &str = "part.lock";

/// Resolved path conventions for one part within a project root.
///
/// ```text
/// <root>/Working/<file_name>                      editable copy
/// <root>/Parts/<stem>/part_meta.json              lifecycle document
/// <root>/Parts/<stem>/part.lock                   transition lock
/// <root>/Parts/<stem>/<vNNN>/<file_name>          snapshot content
/// <root>/Parts/<stem>/<vNNN>/version_meta.json    snapshot provenance
/// ```
///
/// All vault paths for a part derive from here; nothing else in the
/// engine concatenates path segments.
#[derive(Debug, Clone)]
pub struct PartPaths {
    project_root: PathBuf,
    file_name: String,
    file_stem: String,
}

impl PartPaths {
    /// Validates `file_name` and binds it to a project root.
    ///
    /// The name must be a bare file name: path separators, `.`, `..`, and
    /// empty names are rejected so a caller-supplied name can never escape
    /// the vault layout.
    pub fn resolve(project_root: &Path, file_name: &str) -> VaultResult<Self> {
        let invalid = file_name.is_empty()
            || file_name == "."
            || file_name == ".."
            || file_name.contains('/')
            || file_name.contains('\\');
        if invalid {
            return Err(VaultError::InvalidFileName {
                name: file_name.to_string(),
            });
        }
        let file_stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        Ok(Self {
            project_root: project_root.to_path_buf(),
            file_name: file_name.to_string(),
            file_stem,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Part folder name, i.e. the file name without its extension.
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn working_dir(&self) -> PathBuf {
        self.project_root.join(WORKING_DIR)
    }

    pub fn working_file(&self) -> PathBuf {
        self.working_dir().join(&self.file_name)
    }

    pub fn part_folder(&self) -> PathBuf {
        self.project_root.join(PARTS_DIR).join(&self.file_stem)
    }

    pub fn part_meta(&self) -> PathBuf {
        self.part_folder().join(PART_META_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.part_folder().join(PART_LOCK_FILE)
    }

    pub fn version_folder(&self, version: VersionId) -> PathBuf {
        self.part_folder().join(version.to_string())
    }

    pub fn version_file(&self, version: VersionId) -> PathBuf {
        self.version_folder(version).join(&self.file_name)
    }

    pub fn version_meta(&self, version: VersionId) -> PathBuf {
        self.version_folder(version).join(VERSION_META_FILE)
    }
}

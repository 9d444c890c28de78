use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::VersionId;

/// The lifecycle state of a part.
///
/// - `Working`: The editable copy is authoritative; no constraints apply.
/// - `Frozen`: A snapshot was just taken; the working copy may continue to evolve.
/// - `Released`: One snapshot is the approved revision; hosts should refuse edits.
/// - `Unknown`: The part's metadata exists but cannot be read. Never persisted
///   by the engine; only reported by state queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PartState {
    Working,
    Frozen,
    Released,
    Unknown,
}

impl PartState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Working => "Working",
            Self::Frozen => "Frozen",
            Self::Released => "Released",
            Self::Unknown => "Unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Working" => Some(Self::Working),
            "Frozen" => Some(Self::Frozen),
            "Released" => Some(Self::Released),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for PartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-part lifecycle document, persisted as `part_meta.json`.
///
/// A missing document means the part has never been frozen: it is implicitly
/// `Working` with no versions. The identifier fields are kept as the raw
/// strings found on disk; parse them through [`PartRecord::latest_id`] and
/// [`PartRecord::released_id`], which treat anything malformed as absent so
/// that numbering can recover from hand-edited or damaged documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartRecord {
    pub latest_version: String,
    pub released_version: Option<String>,
    pub state: PartState,
}

impl PartRecord {
    pub fn latest_id(&self) -> Option<VersionId> {
        VersionId::parse(&self.latest_version)
    }

    pub fn released_id(&self) -> Option<VersionId> {
        self.released_version.as_deref().and_then(VersionId::parse)
    }
}

/// One row of a vault-wide part listing.
///
/// `state` is `Unknown` when the part's metadata document is present but
/// unreadable; a corrupt part never hides the rest of the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartSummary {
    /// Part folder name, i.e. the tracked file's stem (`Part1` for `Part1.SLDPRT`).
    pub name: String,
    pub state: PartState,
    pub latest_version: String,
    pub released_version: Option<String>,
}

/// Input for initializing the vault folder structure under a project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitProjectInput {
    pub project_path: PathBuf,
}

/// Response for part state queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartStateResponse {
    pub state: PartState,
}

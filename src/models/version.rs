use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PartState;

/// Ordinal identifier of a version snapshot, rendered as `v` plus a
/// zero-padded number (`v001`, `v002`, ..., `v1000`).
///
/// Identifiers order by their numeric value, not lexically, so `v010`
/// sorts after `v002` even though the strings would not. The zero value
/// renders as `v000` and is reserved as the "no versions yet" sentinel
/// returned by latest-version queries on untracked parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId(u32);

impl VersionId {
    /// Sentinel meaning "no versions exist for this part".
    pub const NONE: VersionId = VersionId(0);

    /// The identifier assigned to a part's first snapshot.
    pub fn first() -> Self {
        VersionId(1)
    }

    /// The identifier that follows this one.
    pub fn next(self) -> Self {
        VersionId(self.0 + 1)
    }

    /// Lenient parse used when scanning folder names: `None` for anything
    /// that is not a well-formed identifier.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{:03}", self.0)
    }
}

/// Error for strings that do not match the `vNNN` identifier form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionIdError(String);

impl fmt::Display for ParseVersionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid version identifier: {:?}", self.0)
    }
}

impl std::error::Error for ParseVersionIdError {}

impl FromStr for VersionId {
    type Err = ParseVersionIdError;

    /// Accepts `v` followed by at least three ASCII digits. Snapshot
    /// folders are always written with this shape, so anything else in a
    /// part folder is not a version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('v')
            .ok_or_else(|| ParseVersionIdError(s.to_string()))?;
        if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseVersionIdError(s.to_string()));
        }
        digits
            .parse::<u32>()
            .map(VersionId)
            .map_err(|_| ParseVersionIdError(s.to_string()))
    }
}

impl TryFrom<String> for VersionId {
    type Error = ParseVersionIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VersionId> for String {
    fn from(id: VersionId) -> String {
        id.to_string()
    }
}

/// Provenance document stored beside each snapshot as `version_meta.json`.
///
/// Written exactly once when the snapshot is created and never modified
/// afterwards. `state` is always `Frozen`: snapshots are immutable by
/// definition, and lifecycle changes are recorded on the part, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMeta {
    pub version: VersionId,
    pub created_by: String,
    pub created_timestamp: DateTime<Utc>,
    pub change_note: String,
    pub state: PartState,
}

/// A version snapshot as reported by history and create operations.
///
/// Combines the persisted [`VersionMeta`] with what the filesystem says
/// about the snapshot content right now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: VersionId,
    pub file_name: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub change_note: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    /// Whether the snapshot content currently carries the read-only flag.
    pub locked: bool,
}

/// Input for creating a new version snapshot from the working copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVersionInput {
    /// Root directory of the vault project.
    pub project_path: PathBuf,
    pub change_note: String,
    /// Recorded as the snapshot author. Defaults to the local username.
    #[serde(default)]
    pub author: Option<String>,
}

/// Input for operations that target one existing version of a part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRefInput {
    pub project_path: PathBuf,
    pub version: String,
}

/// Response for the freeze transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreezeResponse {
    pub version: VersionId,
}

/// Response for latest-version queries. `version` is `v000` when the
/// part has no snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestVersionResponse {
    pub version: VersionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_three_digit_padding() {
        assert_eq!(VersionId::first().to_string(), "v001");
        assert_eq!(VersionId::parse("v042").unwrap().to_string(), "v042");
        assert_eq!(VersionId::NONE.to_string(), "v000");
    }

    #[test]
    fn grows_past_three_digits_without_truncating() {
        let id = VersionId::parse("v999").unwrap().next();
        assert_eq!(id.to_string(), "v1000");
        assert_eq!(VersionId::parse("v1000"), Some(id));
    }

    #[test]
    fn rejects_malformed_identifiers() {
        for s in ["", "v", "v1", "v01", "1000", "v00x", "V001", "v-12", "v001 "] {
            assert_eq!(VersionId::parse(s), None, "{s:?} should not parse");
        }
    }

    #[test]
    fn next_increments_numerically() {
        assert_eq!(VersionId::NONE.next(), VersionId::first());
        assert_eq!(VersionId::parse("v009").unwrap().next().to_string(), "v010");
    }

    #[test]
    fn orders_by_number_not_lexically() {
        let a = VersionId::parse("v002").unwrap();
        let b = VersionId::parse("v010").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serializes_as_the_padded_string() {
        let id = VersionId::parse("v007").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"v007\"");
        let back: VersionId = serde_json::from_str("\"v007\"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<VersionId>("\"seven\"").is_err());
    }
}

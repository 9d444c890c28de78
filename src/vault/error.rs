use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by vault operations.
///
/// Every variant maps to a stable machine-readable kind via
/// [`VaultError::kind`]; the HTTP gateway and clients key off those
/// strings rather than the display text.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The part has no editable copy under `Working/`.
    #[error("no working copy for {file_name} at {path}")]
    WorkingFileMissing { file_name: String, path: PathBuf },

    /// The named snapshot does not exist for this part.
    #[error("version {version} not found for part {part}")]
    VersionNotFound { part: String, version: String },

    /// A file or document required by the operation is absent.
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// The requested lifecycle transition is not legal from the part's
    /// current state.
    #[error("invalid transition for part {part}: {reason}")]
    InvalidTransition { part: String, reason: String },

    /// A metadata document exists but cannot be parsed.
    #[error("corrupt metadata at {path}: {source}")]
    CorruptMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The caller-supplied file name is not a bare file name.
    #[error("invalid part file name: {name:?}")]
    InvalidFileName { name: String },

    /// Another writer holds the part's transition lock.
    #[error("part {part} is locked by a concurrent transition")]
    ConcurrencyConflict { part: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl VaultError {
    /// Stable kind string carried in the gateway error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WorkingFileMissing { .. } => "working_file_missing",
            Self::VersionNotFound { .. } => "version_not_found",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::CorruptMetadata { .. } => "corrupt_metadata",
            Self::InvalidFileName { .. } => "invalid_file_name",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Io { .. } => "io_failure",
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type VaultResult<T> = Result<T, VaultError>;

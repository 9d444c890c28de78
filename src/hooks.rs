//! Host-event bridge for CAD integrations.
//!
//! CAD hosts raise document events (save, open, close); [`HostBridge`]
//! translates them into vault queries so an integration layer stays free
//! of lifecycle logic. Nothing here is host-specific: callers pass the
//! project root and file name and act on the returned decision.

use std::path::Path;

use crate::models::{PartState, VersionId};
use crate::vault::{Vault, VaultResult};

/// What the host should do with a pending save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    Allow,
    /// The save must be cancelled; `reason` is shown to the user.
    Deny { reason: String },
}

/// Lifecycle facts surfaced to the user when a document is opened.
#[derive(Debug, Clone)]
pub struct OpenReport {
    pub state: PartState,
    /// `v000` when the part has no versions yet.
    pub latest_version: VersionId,
    pub released_version: Option<String>,
    /// Whether the working copy itself carries the read-only flag.
    pub working_locked: bool,
}

/// Translates host document events into vault decisions.
#[derive(Debug, Clone)]
pub struct HostBridge {
    vault: Vault,
}

impl HostBridge {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }

    /// Called before the host writes the working copy.
    ///
    /// Saving a released part is denied: the approved revision must be
    /// reworked into a new version first. Any failure to determine the
    /// state allows the save; the vault never holds user work hostage
    /// over its own bookkeeping.
    pub fn before_save(&self, project_root: &Path, file_name: &str) -> SaveDecision {
        match self.vault.part_state(project_root, file_name) {
            Ok(PartState::Released) => SaveDecision::Deny {
                reason: format!(
                    "{file_name} is released; rework it into a new version before editing"
                ),
            },
            Ok(PartState::Unknown) => {
                tracing::warn!(file = file_name, "saving part with unreadable metadata");
                SaveDecision::Allow
            }
            Ok(_) => SaveDecision::Allow,
            Err(e) => {
                tracing::warn!(file = file_name, error = %e, "save check failed, allowing save");
                SaveDecision::Allow
            }
        }
    }

    /// Called after the host opens a document; returns what a status
    /// banner should show.
    pub fn after_open(&self, project_root: &Path, file_name: &str) -> VaultResult<OpenReport> {
        let summary = self.vault.part_summary(project_root, file_name)?;
        let latest = self.vault.latest_version(project_root, file_name)?;
        let working_locked = self.vault.working_copy_locked(project_root, file_name)?;
        tracing::info!(
            file = file_name,
            state = %summary.state,
            latest = %latest,
            "document opened"
        );
        Ok(OpenReport {
            state: summary.state,
            latest_version: latest,
            released_version: summary.released_version,
            working_locked,
        })
    }

    /// Called after the host closes a document.
    pub fn after_close(&self, project_root: &Path, file_name: &str) {
        tracing::debug!(
            file = file_name,
            root = %project_root.display(),
            "document closed"
        );
    }
}

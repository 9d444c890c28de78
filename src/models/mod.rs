//! Domain models for PartVault.
//!
//! # Core Concepts
//!
//! - **Part**: A design file tracked by the vault, identified by its file
//!   name. The part folder under `Parts/` is named by the file stem.
//! - **Version**: An immutable snapshot of a part, identified by a
//!   [`VersionId`] ordinal (`v001`, `v002`, ...). Snapshot content and its
//!   [`VersionMeta`] provenance document are written once and never changed.
//! - **Working copy**: The single editable file under `Working/`. It is the
//!   only mutable content in the vault; everything under `Parts/` is history.
//!
//! Lifecycle state lives on the part ([`PartRecord`]), not on versions:
//! a part moves between `Working`, `Frozen`, and `Released`, while each
//! version stays frozen forever.

mod part;
mod version;

pub use part::*;
pub use version::*;

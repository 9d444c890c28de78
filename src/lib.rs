//! PartVault: file-based version control and lifecycle management for
//! CAD design files.
//!
//! The filesystem is the only system of record. A project root holds an
//! editable working copy per part and an immutable, numbered snapshot
//! history with JSON metadata beside it:
//!
//! - [`vault`]: the engine (snapshots, lifecycle transitions, per-part
//!   locking).
//! - [`api`]: the HTTP gateway over the engine.
//! - [`client`]: typed HTTP client for a remotely served vault.
//! - [`hooks`]: bridge for CAD host document events.
//! - [`models`]: the shared domain types and wire shapes.

pub mod api;
pub mod client;
pub mod hooks;
pub mod models;
pub mod vault;

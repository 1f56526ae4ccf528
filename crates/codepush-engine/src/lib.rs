//! Codepush Engine - Orchestration layer
//!
//! Coordinates the release ledger, the content store and the blob transport:
//! dedup checks, atomic releases, the release-upload flow and delta diff
//! generation.

pub mod commands;
pub mod config;
pub mod ledger;

pub use commands::diff::{DiffEngine, DiffReport};
pub use commands::release::ReleaseEngine;
pub use commands::upload::{PackageInfo, ReleaseUpload, UploadedFile};
pub use commands::PackageManager;
pub use config::EngineConfig;
pub use ledger::Ledger;

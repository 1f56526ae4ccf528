//! Codepush Store - release ledger, content store, archives and transports
//!
//! Provides:
//! - SQLite release ledger with an embedded migrations framework
//! - Repository functions for deployments, versions, packages and diffs
//! - The atomic release transaction and best-effort history append
//! - Filesystem content-addressable store for extracted bundles
//! - Deterministic zip archiver and safe extraction
//! - Local-directory and HTTP blob transports

pub mod archive;
pub mod cas;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod release;
pub mod repo;
pub mod transport;

// Re-export key types
pub use cas::FsContentStore;
pub use errors::Result;
pub use repo::SqliteRepo;
pub use transport::{HttpBlobTransport, LocalBlobTransport};

//! Codepush Core - release domain model and pure algorithms
//!
//! This crate provides the foundational pieces shared by the ledger and the
//! orchestration layer:
//! - Deployment, DeploymentVersion, Package and PackageDiff models
//! - Structured error facility with stable error codes
//! - Structured logging facility
//! - File manifests and the manifest differ
//! - Delta plans and the `hotcodepush.json` deletion manifest
//! - Collaborator traits for the content store and blob transport

pub mod content_store;
pub mod delta;
pub mod errors;
pub mod hashing;
pub mod logging_facility;
pub mod manifest;
pub mod model;
pub mod platform;
pub mod transport;

// Re-export commonly used types
pub use content_store::{ContentStore, StoredContent};
pub use delta::{DeletionManifest, DeltaPlan, DELETION_MANIFEST_NAME};
pub use errors::{ExError, ExErrorKind, Result};
pub use manifest::{diff_manifests, Manifest, ManifestDiff};
pub use model::{
    Deployment, DeploymentVersion, Package, PackageDiff, ReleaseHistoryEntry, ReleaseMethod,
    ReleaseParams,
};
pub use platform::Platform;
pub use transport::{BlobTransport, MemoryBlobTransport};

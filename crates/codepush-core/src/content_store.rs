//! Content store collaborator interface
//!
//! The content store owns extracted bundle contents addressed by package
//! hash and is the sole source of truth for "does this content already
//! exist". Implementations must make concurrent ingests of the same content
//! idempotent.

use crate::errors::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local handle to stored, extracted content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub package_hash: String,
    /// Directory holding the extracted files
    pub content_path: PathBuf,
    /// Manifest file describing `content_path`
    pub manifest_path: PathBuf,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Whether content with this package hash is already stored
    async fn exists(&self, package_hash: &str) -> Result<bool>;

    /// Locate stored content
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is stored under `package_hash`.
    async fn fetch_extracted(&self, package_hash: &str) -> Result<StoredContent>;

    /// Copy a local directory into the store, assigning its package hash
    async fn ingest(&self, local_dir: &Path) -> Result<StoredContent>;
}

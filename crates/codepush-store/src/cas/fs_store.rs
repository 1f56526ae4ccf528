//! Filesystem content store
//!
//! Each entry is a directory `<root>/<hash[0..2]>/<hash>/` holding the
//! extracted files under `content/` and their manifest in `manifest.json`.
//! The hash is the package hash of the manifest, so two ingests of the same
//! tree land on the same entry.

#![allow(clippy::result_large_err)]

use crate::cas::atomic::{copy_tree, publish_dir};
use crate::cas::sharding::shard_dir;
use crate::errors::{content_missing, io_error, join_error, Result};
use async_trait::async_trait;
use codepush_core::content_store::{ContentStore, StoredContent};
use codepush_core::hashing::hash_file;
use codepush_core::manifest::Manifest;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest inside an entry
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const CONTENT_DIR_NAME: &str = "content";

/// Compute the manifest of every regular file below `dir`
///
/// Paths are relative to `dir` and `/`-separated.
pub fn manifest_from_dir(dir: &Path) -> Result<Manifest> {
    let mut manifest = Manifest::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| io_error("build_manifest", e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let relative: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        manifest.insert(relative.join("/"), hash_file(entry.path())?);
    }
    Ok(manifest)
}

/// Filesystem-backed content store
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stored(&self, package_hash: &str) -> StoredContent {
        let dir = shard_dir(&self.root, package_hash);
        StoredContent {
            package_hash: package_hash.to_string(),
            content_path: dir.join(CONTENT_DIR_NAME),
            manifest_path: dir.join(MANIFEST_FILE_NAME),
        }
    }

    fn exists_blocking(&self, package_hash: &str) -> bool {
        self.stored(package_hash).manifest_path.is_file()
    }

    fn ingest_blocking(&self, local_dir: &Path) -> Result<StoredContent> {
        let manifest = manifest_from_dir(local_dir)?;
        let package_hash = manifest.package_hash()?;
        let stored = self.stored(&package_hash);

        if stored.manifest_path.is_file() {
            tracing::debug!(package_hash = %package_hash, "Content already stored");
            return Ok(stored);
        }

        let target = shard_dir(&self.root, &package_hash);
        let shard = target.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(shard).map_err(|e| io_error("create_cas_dir", e))?;

        let staging = tempfile::Builder::new()
            .prefix(".ingest_")
            .tempdir_in(shard)
            .map_err(|e| io_error("stage_content", e))?;
        copy_tree(local_dir, &staging.path().join(CONTENT_DIR_NAME))?;
        fs::write(
            staging.path().join(MANIFEST_FILE_NAME),
            manifest.to_json()?.as_bytes(),
        )
        .map_err(|e| io_error("write_manifest", e))?;

        if publish_dir(staging.path(), &target)? {
            tracing::debug!(
                package_hash = %package_hash,
                files = manifest.len(),
                "Ingested content"
            );
        }

        Ok(stored)
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn exists(&self, package_hash: &str) -> Result<bool> {
        let store = self.clone();
        let hash = package_hash.to_string();
        tokio::task::spawn_blocking(move || store.exists_blocking(&hash))
            .await
            .map_err(|e| join_error("content_exists", e))
    }

    async fn fetch_extracted(&self, package_hash: &str) -> Result<StoredContent> {
        if self.exists(package_hash).await? {
            Ok(self.stored(package_hash))
        } else {
            Err(content_missing(package_hash))
        }
    }

    async fn ingest(&self, local_dir: &Path) -> Result<StoredContent> {
        let store = self.clone();
        let dir = local_dir.to_path_buf();
        tokio::task::spawn_blocking(move || store.ingest_blocking(&dir))
            .await
            .map_err(|e| join_error("ingest_content", e))?
    }
}

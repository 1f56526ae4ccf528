//! File manifests
//!
//! A manifest maps each relative file path of a bundle (always `/`-separated)
//! to the content hash of that file. Its canonical form is a compact JSON
//! object with keys in sorted order; the package hash is the hash of that
//! canonical form.

pub mod differ;

pub use differ::{diff_manifests, ManifestDiff};

use crate::errors::{io_error, serialization_error, ExError, ExErrorKind, Result};
use crate::hashing::hash_bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Normalize a relative path to forward-slash separators
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Mapping of relative path -> file content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    files: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file; the path is normalized to `/` separators
    pub fn insert(&mut self, path: impl AsRef<str>, hash: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), hash.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate `(path, hash)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, h)| (p.as_str(), h.as_str()))
    }

    /// Parse a manifest from JSON bytes
    ///
    /// # Errors
    ///
    /// `InvalidManifest` if the bytes are not a JSON object of strings.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let files: BTreeMap<String, String> = serde_json::from_slice(bytes).map_err(|e| {
            ExError::new(ExErrorKind::InvalidManifest)
                .with_op("parse_manifest")
                .with_message(format!("manifest is not a path -> hash object: {}", e))
        })?;
        let mut manifest = Manifest::new();
        for (path, hash) in files {
            manifest.insert(path, hash);
        }
        Ok(manifest)
    }

    /// Read and parse a manifest file
    pub fn read_from(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            io_error("read_manifest", e).with_entity_id(path.display().to_string())
        })?;
        Self::from_json_slice(&bytes)
    }

    /// Canonical JSON form (compact, sorted keys)
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.files).map_err(|e| serialization_error("manifest_to_json", e))
    }

    /// Package hash: hash of the canonical JSON form
    pub fn package_hash(&self) -> Result<String> {
        Ok(hash_bytes(self.to_json()?.as_bytes()))
    }
}

impl<P: AsRef<str>, H: Into<String>> FromIterator<(P, H)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (P, H)>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for (path, hash) in iter {
            manifest.insert(path, hash);
        }
        manifest
    }
}

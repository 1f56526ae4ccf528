//! Manifest differ
//!
//! Compares the manifest of the release being diffed *to* (the original)
//! with the manifest of an older release a client may already hold (the
//! destination).

use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};

/// Three-way partition of paths between two manifests
///
/// All lists are sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDiff {
    /// Present in both with different hashes
    pub changed: Vec<String>,
    /// Present only in the original (new files the client lacks)
    pub only_in_original: Vec<String>,
    /// Present only in the destination (files the client must delete)
    pub only_in_destination: Vec<String>,
}

impl ManifestDiff {
    /// Paths that must be shipped in a delta: changed plus new, sorted
    pub fn files_to_ship(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .changed
            .iter()
            .chain(self.only_in_original.iter())
            .cloned()
            .collect();
        files.sort();
        files
    }

    /// True when both manifests describe identical content
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
            && self.only_in_original.is_empty()
            && self.only_in_destination.is_empty()
    }
}

/// Diff two manifests
pub fn diff_manifests(original: &Manifest, destination: &Manifest) -> ManifestDiff {
    let mut diff = ManifestDiff::default();

    for (path, hash) in original.iter() {
        match destination.get(path) {
            Some(dest_hash) if dest_hash == hash => {}
            Some(_) => diff.changed.push(path.to_string()),
            None => diff.only_in_original.push(path.to_string()),
        }
    }

    diff.only_in_destination = destination
        .iter()
        .filter(|(path, _)| !original.contains(path))
        .map(|(path, _)| path.to_string())
        .collect();

    diff
}

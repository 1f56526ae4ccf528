//! Delta plans
//!
//! A delta bundle carries every changed or new file of the original release
//! at its relative path, plus a deletion manifest at `hotcodepush.json`
//! listing paths the client must remove:
//!
//! ```json
//! {"deletedFiles":["x.js","z.js"]}
//! ```

use crate::errors::{serialization_error, Result};
use crate::manifest::{diff_manifests, Manifest, ManifestDiff};
use serde::{Deserialize, Serialize};

/// Archive entry name of the deletion manifest
pub const DELETION_MANIFEST_NAME: &str = "hotcodepush.json";

/// Paths a client must delete after applying a delta
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionManifest {
    #[serde(rename = "deletedFiles")]
    pub deleted_files: Vec<String>,
}

impl DeletionManifest {
    /// Compact JSON bytes as stored in the archive
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| serialization_error("deletion_manifest", e))
    }
}

/// What one delta bundle must contain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaPlan {
    /// Changed or new paths, read from the original's content
    pub files: Vec<String>,
    pub deletion: DeletionManifest,
}

impl DeltaPlan {
    pub fn from_diff(diff: &ManifestDiff) -> Self {
        Self {
            files: diff.files_to_ship(),
            deletion: DeletionManifest {
                deleted_files: diff.only_in_destination.clone(),
            },
        }
    }

    /// Plan transforming `destination` content into `original` content
    pub fn between(original: &Manifest, destination: &Manifest) -> Self {
        Self::from_diff(&diff_manifests(original, destination))
    }
}

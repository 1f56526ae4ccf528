use crate::model::release::ReleaseMethod;
use serde::{Deserialize, Serialize};

/// One immutable released artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub deployment_version_id: i64,
    pub deployment_id: i64,
    pub description: String,
    /// Content hash of the extracted bundle (hash of its manifest)
    pub package_hash: String,
    /// Blob key of the uploaded full bundle
    pub blob_url: String,
    pub size: i64,
    /// Blob key of the uploaded file manifest
    pub manifest_blob_url: String,
    pub release_method: ReleaseMethod,
    /// Human label, `v{n}`, strictly increasing per deployment
    pub label: String,
    pub released_by: i64,
    pub original_label: Option<String>,
    pub original_deployment: Option<String>,
    pub created_at: i64,
}

/// Cached delta bundle transforming an older Package's content into this one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDiff {
    pub id: i64,
    /// Target Package (the newer release)
    pub package_id: i64,
    /// Content hash of the Package this delta applies to
    pub diff_against_package_hash: String,
    pub diff_blob_url: String,
    pub diff_size: i64,
    pub created_at: i64,
}

/// Install counters reported against one Package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetrics {
    pub id: i64,
    pub package_id: i64,
    pub active: i64,
    pub downloaded: i64,
    pub failed: i64,
    pub installed: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Append-only audit record of a Package creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseHistoryEntry {
    pub id: i64,
    pub deployment_id: i64,
    pub package_id: i64,
    pub created_at: i64,
}

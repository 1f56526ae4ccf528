//! Row hydration
//!
//! Maps ledger rows onto the codepush-core models. Column lists are kept
//! next to their mappers so queries and mappers cannot drift apart.

use codepush_core::model::{
    Deployment, DeploymentVersion, Package, PackageDiff, PackageMetrics, ReleaseHistoryEntry,
    ReleaseMethod,
};
use rusqlite::types::Type;
use rusqlite::Row;

pub const DEPLOYMENT_COLUMNS: &str =
    "id, name, deployment_key, label_id, last_deployment_version_id, created_at";

pub const VERSION_COLUMNS: &str =
    "id, deployment_id, app_version, is_mandatory, current_package_id, created_at";

pub const PACKAGE_COLUMNS: &str = "id, deployments_versions_id, deployment_id, description, \
     package_hash, blob_url, size, manifest_blob_url, release_method, label, released_by, \
     original_label, original_deployment, created_at";

pub const DIFF_COLUMNS: &str =
    "id, package_id, diff_against_package_hash, diff_blob_url, diff_size, created_at";

pub const HISTORY_COLUMNS: &str = "id, deployment_id, package_id, created_at";

pub const METRICS_COLUMNS: &str =
    "id, package_id, active, downloaded, failed, installed, created_at, updated_at";

pub fn deployment_from_row(row: &Row<'_>) -> rusqlite::Result<Deployment> {
    Ok(Deployment {
        id: row.get(0)?,
        name: row.get(1)?,
        deployment_key: row.get(2)?,
        label_id: row.get(3)?,
        last_deployment_version_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn version_from_row(row: &Row<'_>) -> rusqlite::Result<DeploymentVersion> {
    Ok(DeploymentVersion {
        id: row.get(0)?,
        deployment_id: row.get(1)?,
        app_version: row.get(2)?,
        is_mandatory: row.get::<_, i64>(3)? != 0,
        current_package_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn package_from_row(row: &Row<'_>) -> rusqlite::Result<Package> {
    let method: String = row.get(8)?;
    let release_method = ReleaseMethod::parse(&method).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            Type::Text,
            format!("unknown release method '{}'", method).into(),
        )
    })?;

    Ok(Package {
        id: row.get(0)?,
        deployment_version_id: row.get(1)?,
        deployment_id: row.get(2)?,
        description: row.get(3)?,
        package_hash: row.get(4)?,
        blob_url: row.get(5)?,
        size: row.get(6)?,
        manifest_blob_url: row.get(7)?,
        release_method,
        label: row.get(9)?,
        released_by: row.get(10)?,
        original_label: row.get(11)?,
        original_deployment: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub fn diff_from_row(row: &Row<'_>) -> rusqlite::Result<PackageDiff> {
    Ok(PackageDiff {
        id: row.get(0)?,
        package_id: row.get(1)?,
        diff_against_package_hash: row.get(2)?,
        diff_blob_url: row.get(3)?,
        diff_size: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn history_from_row(row: &Row<'_>) -> rusqlite::Result<ReleaseHistoryEntry> {
    Ok(ReleaseHistoryEntry {
        id: row.get(0)?,
        deployment_id: row.get(1)?,
        package_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn metrics_from_row(row: &Row<'_>) -> rusqlite::Result<PackageMetrics> {
    Ok(PackageMetrics {
        id: row.get(0)?,
        package_id: row.get(1)?,
        active: row.get(2)?,
        downloaded: row.get(3)?,
        failed: row.get(4)?,
        installed: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

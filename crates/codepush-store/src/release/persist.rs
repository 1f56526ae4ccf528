//! Atomic release persistence
//!
//! One IMMEDIATE transaction takes the write lock at BEGIN, so the label
//! counter, version row, package row and both pointers are serialized
//! against concurrent releases and commit together or not at all.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::SqliteRepo;
use codepush_core::errors::{ExError, ExErrorKind, ReleaseError};
use codepush_core::model::{format_label, Package, ReleaseHistoryEntry, ReleaseParams};
use rusqlite::{Connection, TransactionBehavior};

/// Content references of a release about to be committed
#[derive(Debug, Clone)]
pub struct ReleaseRecord<'a> {
    pub deployment_id: i64,
    pub app_version: &'a str,
    pub package_hash: &'a str,
    pub manifest_blob_url: &'a str,
    pub blob_url: &'a str,
}

/// Create a Package and make it the version's current release
///
/// Steps, all inside one transaction:
/// 1. bump the deployment's label counter
/// 2. find or create the version row
/// 3. insert the package
/// 4. point the version at the package and set its mandatory flag
/// 5. point the deployment at the version
///
/// The version's current hash is re-checked after the write lock is held,
/// so two racing uploads of identical content cannot both commit.
///
/// # Errors
///
/// - `NotFound`: deployment does not exist
/// - `DuplicateRelease`: the content is already the current release
/// - `Persistence` / `Concurrency`: the transaction failed and was rolled back
pub fn commit_release(
    conn: &mut Connection,
    record: &ReleaseRecord<'_>,
    params: &ReleaseParams,
) -> Result<Package> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let bumped = tx
        .execute(
            "UPDATE deployments SET label_id = label_id + 1 WHERE id = ?1",
            [record.deployment_id],
        )
        .map_err(from_rusqlite)?;
    if bumped == 0 {
        return Err(ReleaseError::DeploymentNotFound {
            deployment_id: record.deployment_id,
        }
        .into());
    }
    let label_id: i64 = tx
        .query_row(
            "SELECT label_id FROM deployments WHERE id = ?1",
            [record.deployment_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)?;

    let version = SqliteRepo::find_or_create_version(&tx, record.deployment_id, record.app_version)?;

    if let Some(current_id) = version.current_package() {
        let current = SqliteRepo::get_package(&tx, current_id)?;
        if current.is_some_and(|p| p.package_hash == record.package_hash) {
            return Err(ReleaseError::Duplicate {
                deployment_id: record.deployment_id,
                app_version: record.app_version.to_string(),
            }
            .into());
        }
    }

    let label = format_label(label_id);
    tx.execute(
        "INSERT INTO packages (
            deployments_versions_id, deployment_id, description, package_hash, blob_url, size,
            manifest_blob_url, release_method, label, released_by, original_label,
            original_deployment, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            version.id,
            record.deployment_id,
            params.description,
            record.package_hash,
            record.blob_url,
            params.size,
            record.manifest_blob_url,
            params.release_method.as_str(),
            label,
            params.release_uid,
            params.original_label,
            params.original_deployment,
            chrono::Utc::now().timestamp(),
        ],
    )
    .map_err(from_rusqlite)?;
    let package_id = tx.last_insert_rowid();
    SqliteRepo::init_package_metrics(&tx, package_id)?;

    tx.execute(
        "UPDATE deployments_versions SET is_mandatory = ?1, current_package_id = ?2 WHERE id = ?3",
        rusqlite::params![params.is_mandatory, package_id, version.id],
    )
    .map_err(from_rusqlite)?;

    tx.execute(
        "UPDATE deployments SET last_deployment_version_id = ?1 WHERE id = ?2",
        rusqlite::params![version.id, record.deployment_id],
    )
    .map_err(from_rusqlite)?;

    let package = SqliteRepo::get_package(&tx, package_id)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op("commit_release")
            .with_entity_id(package_id.to_string())
            .with_message("package vanished inside its own transaction")
    })?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(
        deployment_id = record.deployment_id,
        package_id,
        label = %package.label,
        "Committed release"
    );

    Ok(package)
}

/// Append a release history entry
///
/// # Errors
///
/// `HistoryWrite` wrapping the underlying ledger failure.
pub fn append_history(conn: &Connection, deployment_id: i64, package_id: i64) -> Result<ReleaseHistoryEntry> {
    let created_at = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO deployments_history (deployment_id, package_id, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![deployment_id, package_id, created_at],
    )
    .map_err(|e| {
        ExError::new(ExErrorKind::HistoryWrite)
            .with_op("append_history")
            .with_entity_id(package_id.to_string())
            .with_message("failed to append release history")
            .with_source(from_rusqlite(e))
    })?;

    Ok(ReleaseHistoryEntry {
        id: conn.last_insert_rowid(),
        deployment_id,
        package_id,
        created_at,
    })
}

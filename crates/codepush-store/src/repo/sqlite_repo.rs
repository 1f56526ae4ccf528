//! SQLite repository implementation
//!
//! Every function takes a `&Connection`; a `Transaction` derefs to one, so
//! the same calls serve both standalone reads and the release transaction.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::repo::hydration::{
    deployment_from_row, diff_from_row, history_from_row, metrics_from_row, package_from_row,
    version_from_row, DEPLOYMENT_COLUMNS, DIFF_COLUMNS, HISTORY_COLUMNS, METRICS_COLUMNS,
    PACKAGE_COLUMNS, VERSION_COLUMNS,
};
use codepush_core::model::{
    Deployment, DeploymentVersion, Package, PackageDiff, PackageMetrics, ReleaseHistoryEntry,
};
use rusqlite::{Connection, OptionalExtension};

/// SQLite repository for the release ledger
pub struct SqliteRepo;

impl SqliteRepo {
    /// Create a deployment channel
    pub fn create_deployment(conn: &Connection, name: &str, deployment_key: &str) -> Result<Deployment> {
        conn.execute(
            "INSERT INTO deployments (name, deployment_key, label_id, last_deployment_version_id, created_at)
             VALUES (?1, ?2, 0, 0, ?3)",
            rusqlite::params![name, deployment_key, chrono::Utc::now().timestamp()],
        )
        .map_err(from_rusqlite)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(deployment_id = id, name, "Created deployment");

        Self::get_deployment(conn, id)?.ok_or_else(|| {
            codepush_core::ExError::new(codepush_core::ExErrorKind::Internal)
                .with_op("create_deployment")
                .with_entity_id(id.to_string())
                .with_message("deployment vanished after insert")
        })
    }

    pub fn get_deployment(conn: &Connection, id: i64) -> Result<Option<Deployment>> {
        conn.query_row(
            &format!("SELECT {} FROM deployments WHERE id = ?1", DEPLOYMENT_COLUMNS),
            [id],
            deployment_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn get_deployment_by_key(conn: &Connection, deployment_key: &str) -> Result<Option<Deployment>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM deployments WHERE deployment_key = ?1",
                DEPLOYMENT_COLUMNS
            ),
            [deployment_key],
            deployment_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Look up the version row for a (deployment, app version) pair
    pub fn get_deployment_version(
        conn: &Connection,
        deployment_id: i64,
        app_version: &str,
    ) -> Result<Option<DeploymentVersion>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM deployments_versions WHERE deployment_id = ?1 AND app_version = ?2",
                VERSION_COLUMNS
            ),
            rusqlite::params![deployment_id, app_version],
            version_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn get_deployment_version_by_id(conn: &Connection, id: i64) -> Result<Option<DeploymentVersion>> {
        conn.query_row(
            &format!("SELECT {} FROM deployments_versions WHERE id = ?1", VERSION_COLUMNS),
            [id],
            version_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Return the version row for the pair, creating it if absent
    ///
    /// New rows start non-mandatory with no current package. The unique key
    /// on (deployment_id, app_version) makes concurrent callers converge on
    /// the same row.
    pub fn find_or_create_version(
        conn: &Connection,
        deployment_id: i64,
        app_version: &str,
    ) -> Result<DeploymentVersion> {
        conn.execute(
            "INSERT INTO deployments_versions (deployment_id, app_version, is_mandatory, current_package_id, created_at)
             VALUES (?1, ?2, 0, 0, ?3)
             ON CONFLICT(deployment_id, app_version) DO NOTHING",
            rusqlite::params![deployment_id, app_version, chrono::Utc::now().timestamp()],
        )
        .map_err(from_rusqlite)?;

        conn.query_row(
            &format!(
                "SELECT {} FROM deployments_versions WHERE deployment_id = ?1 AND app_version = ?2",
                VERSION_COLUMNS
            ),
            rusqlite::params![deployment_id, app_version],
            version_from_row,
        )
        .map_err(from_rusqlite)
    }

    pub fn get_package(conn: &Connection, id: i64) -> Result<Option<Package>> {
        conn.query_row(
            &format!("SELECT {} FROM packages WHERE id = ?1", PACKAGE_COLUMNS),
            [id],
            package_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Up to `limit` packages of the same version with a smaller id, newest first
    pub fn list_predecessor_packages(conn: &Connection, package: &Package, limit: usize) -> Result<Vec<Package>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM packages
                 WHERE deployments_versions_id = ?1 AND id < ?2
                 ORDER BY id DESC
                 LIMIT ?3",
                PACKAGE_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let packages = stmt
            .query_map(
                rusqlite::params![package.deployment_version_id, package.id, limit],
                package_from_row,
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(packages)
    }

    /// Packages released to a deployment, oldest first
    pub fn list_packages(conn: &Connection, deployment_id: i64) -> Result<Vec<Package>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM packages WHERE deployment_id = ?1 ORDER BY id",
                PACKAGE_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let packages = stmt
            .query_map([deployment_id], package_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(packages)
    }

    pub fn find_package_diff(
        conn: &Connection,
        package_id: i64,
        diff_against_package_hash: &str,
    ) -> Result<Option<PackageDiff>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM packages_diff WHERE package_id = ?1 AND diff_against_package_hash = ?2",
                DIFF_COLUMNS
            ),
            rusqlite::params![package_id, diff_against_package_hash],
            diff_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    /// Record a diff, keeping the first row if one already exists
    ///
    /// Returns the stored row, which may belong to a concurrent writer.
    pub fn insert_package_diff(
        conn: &Connection,
        package_id: i64,
        diff_against_package_hash: &str,
        diff_blob_url: &str,
        diff_size: i64,
    ) -> Result<PackageDiff> {
        let inserted = conn
            .execute(
                "INSERT INTO packages_diff (package_id, diff_against_package_hash, diff_blob_url, diff_size, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(package_id, diff_against_package_hash) DO NOTHING",
                rusqlite::params![
                    package_id,
                    diff_against_package_hash,
                    diff_blob_url,
                    diff_size,
                    chrono::Utc::now().timestamp(),
                ],
            )
            .map_err(from_rusqlite)?;

        if inserted == 0 {
            tracing::debug!(
                package_id,
                diff_against_package_hash,
                "Package diff already recorded"
            );
        }

        conn.query_row(
            &format!(
                "SELECT {} FROM packages_diff WHERE package_id = ?1 AND diff_against_package_hash = ?2",
                DIFF_COLUMNS
            ),
            rusqlite::params![package_id, diff_against_package_hash],
            diff_from_row,
        )
        .map_err(from_rusqlite)
    }

    pub fn list_package_diffs(conn: &Connection, package_id: i64) -> Result<Vec<PackageDiff>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM packages_diff WHERE package_id = ?1 ORDER BY id",
                DIFF_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let diffs = stmt
            .query_map([package_id], diff_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(diffs)
    }

    /// Zeroed counters for a freshly released package
    pub fn init_package_metrics(conn: &Connection, package_id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO packages_metrics (package_id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(package_id) DO NOTHING",
            rusqlite::params![package_id, now],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn get_package_metrics(conn: &Connection, package_id: i64) -> Result<Option<PackageMetrics>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM packages_metrics WHERE package_id = ?1",
                METRICS_COLUMNS
            ),
            [package_id],
            metrics_from_row,
        )
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn list_history(conn: &Connection, deployment_id: i64) -> Result<Vec<ReleaseHistoryEntry>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM deployments_history WHERE deployment_id = ?1 ORDER BY id",
                HISTORY_COLUMNS
            ))
            .map_err(from_rusqlite)?;

        let entries = stmt
            .query_map([deployment_id], history_from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;

        Ok(entries)
    }

    pub fn count_history(conn: &Connection, deployment_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT COUNT(*) FROM deployments_history WHERE deployment_id = ?1",
            [deployment_id],
            |row| row.get(0),
        )
        .map_err(from_rusqlite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_ledger_in_memory;

    #[test]
    fn test_create_and_get_deployment() {
        let conn = open_ledger_in_memory().unwrap();
        let created = SqliteRepo::create_deployment(&conn, "Production", "key-prod").unwrap();

        assert_eq!(created.label_id, 0);
        assert_eq!(created.last_deployment_version_id, 0);
        assert_eq!(
            SqliteRepo::get_deployment(&conn, created.id).unwrap(),
            Some(created.clone())
        );
        assert_eq!(
            SqliteRepo::get_deployment_by_key(&conn, "key-prod")
                .unwrap()
                .map(|d| d.id),
            Some(created.id)
        );
    }

    #[test]
    fn test_duplicate_deployment_key_rejected() {
        let conn = open_ledger_in_memory().unwrap();
        SqliteRepo::create_deployment(&conn, "A", "same").unwrap();
        assert!(SqliteRepo::create_deployment(&conn, "B", "same").is_err());
    }

    #[test]
    fn test_find_or_create_version_is_idempotent() {
        let conn = open_ledger_in_memory().unwrap();
        let dep = SqliteRepo::create_deployment(&conn, "Staging", "key").unwrap();

        let first = SqliteRepo::find_or_create_version(&conn, dep.id, "1.0").unwrap();
        let second = SqliteRepo::find_or_create_version(&conn, dep.id, "1.0").unwrap();

        assert_eq!(first.id, second.id);
        assert!(!first.is_mandatory);
        assert_eq!(first.current_package(), None);
    }

    #[test]
    fn test_find_or_create_version_requires_deployment() {
        let conn = open_ledger_in_memory().unwrap();
        assert!(SqliteRepo::find_or_create_version(&conn, 42, "1.0").is_err());
    }

    #[test]
    fn test_missing_rows_are_none() {
        let conn = open_ledger_in_memory().unwrap();
        assert!(SqliteRepo::get_deployment(&conn, 1).unwrap().is_none());
        assert!(SqliteRepo::get_package(&conn, 1).unwrap().is_none());
        assert!(SqliteRepo::get_deployment_version(&conn, 1, "1.0")
            .unwrap()
            .is_none());
        assert!(SqliteRepo::find_package_diff(&conn, 1, "h").unwrap().is_none());
    }
}

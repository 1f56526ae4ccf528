//! Dedup check against a version's current release

#![allow(clippy::result_large_err)]

use crate::errors::Result;
use crate::repo::SqliteRepo;
use codepush_core::errors::ReleaseError;
use rusqlite::Connection;

/// Whether `package_hash` equals the current release of the version
///
/// Creates the (deployment, app version) row when it does not exist yet, so
/// every later release or diff path has a row to hang off. A version with no
/// current package never matches.
///
/// # Errors
///
/// `NotFound` when the deployment does not exist.
pub fn matches_current_release(
    conn: &Connection,
    deployment_id: i64,
    app_version: &str,
    package_hash: &str,
) -> Result<bool> {
    if SqliteRepo::get_deployment(conn, deployment_id)?.is_none() {
        return Err(ReleaseError::DeploymentNotFound { deployment_id }.into());
    }

    let version = SqliteRepo::find_or_create_version(conn, deployment_id, app_version)?;
    let Some(current_id) = version.current_package() else {
        return Ok(false);
    };

    Ok(SqliteRepo::get_package(conn, current_id)?
        .map(|current| current.package_hash == package_hash)
        .unwrap_or(false))
}

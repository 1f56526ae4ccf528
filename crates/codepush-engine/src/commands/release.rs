//! Dedup check and atomic release
//!
//! ## Logging Ownership
//!
//! This layer owns lifecycle logging for `check_duplicate` and `release`;
//! the store only emits `tracing::debug!` details.

#![allow(clippy::result_large_err)]

use crate::ledger::Ledger;
use codepush_core::errors::{ExErrorKind, Result};
use codepush_core::model::{Package, ReleaseParams};
use codepush_core::{log_op_end, log_op_error, log_op_start};
use codepush_core_types::RequestId;
use codepush_store::release::{append_history, commit_release, matches_current_release, ReleaseRecord};
use tokio::task::JoinHandle;

/// Dedup & release engine over a shared ledger
#[derive(Clone)]
pub struct ReleaseEngine {
    ledger: Ledger,
}

impl ReleaseEngine {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether `package_hash` is already the current release of the version
    ///
    /// Lazily creates the (deployment, app version) row on first sight.
    ///
    /// # Errors
    ///
    /// - `NotFound`: deployment does not exist
    /// - `Persistence`: ledger failure
    pub async fn check_duplicate(
        &self,
        deployment_id: i64,
        app_version: &str,
        package_hash: &str,
    ) -> Result<bool> {
        let request_id = RequestId::new();
        log_op_start!(
            "check_duplicate",
            request_id = %request_id,
            deployment_id = deployment_id,
            app_version = app_version
        );
        let start = std::time::Instant::now();

        let version = app_version.to_string();
        let hash = package_hash.to_string();
        let result = self
            .ledger
            .run("check_duplicate", move |conn| {
                matches_current_release(conn, deployment_id, &version, &hash)
            })
            .await
            .map_err(|e| {
                log_op_error!(
                    "check_duplicate",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %request_id
                );
                e.with_request_id(request_id.clone())
            })?;

        log_op_end!(
            "check_duplicate",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            duplicate = result
        );
        Ok(result)
    }

    /// Create a Package and make it the version's current release
    ///
    /// History is appended afterwards by a detached task; its failure is
    /// logged and never reaches the caller.
    ///
    /// # Errors
    ///
    /// - `NotFound`: deployment does not exist
    /// - `DuplicateRelease`: content equals the current release
    /// - `Persistence` / `Concurrency`: transaction rolled back
    pub async fn release(
        &self,
        deployment_id: i64,
        app_version: &str,
        package_hash: &str,
        manifest_blob_url: &str,
        blob_url: &str,
        params: ReleaseParams,
    ) -> Result<Package> {
        self.release_tracked(
            deployment_id,
            app_version,
            package_hash,
            manifest_blob_url,
            blob_url,
            params,
        )
        .await
        .map(|(package, _history)| package)
    }

    /// Like [`release`](Self::release), also returning the history task
    pub async fn release_tracked(
        &self,
        deployment_id: i64,
        app_version: &str,
        package_hash: &str,
        manifest_blob_url: &str,
        blob_url: &str,
        params: ReleaseParams,
    ) -> Result<(Package, JoinHandle<()>)> {
        let request_id = RequestId::new();
        log_op_start!(
            "release",
            request_id = %request_id,
            deployment_id = deployment_id,
            app_version = app_version,
            package_hash = package_hash
        );
        let start = std::time::Instant::now();

        let version = app_version.to_string();
        let hash = package_hash.to_string();
        let manifest = manifest_blob_url.to_string();
        let blob = blob_url.to_string();
        let package = self
            .ledger
            .run("release", move |conn| {
                let record = ReleaseRecord {
                    deployment_id,
                    app_version: &version,
                    package_hash: &hash,
                    manifest_blob_url: &manifest,
                    blob_url: &blob,
                };
                commit_release(conn, &record, &params)
            })
            .await
            .map_err(|e| {
                log_op_error!(
                    "release",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %request_id
                );
                e.with_request_id(request_id.clone())
            })?;

        let history = self.spawn_history(deployment_id, package.id, request_id.clone());

        log_op_end!(
            "release",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            package_id = package.id,
            label = %package.label
        );
        Ok((package, history))
    }

    fn spawn_history(&self, deployment_id: i64, package_id: i64, request_id: RequestId) -> JoinHandle<()> {
        let ledger = self.ledger.clone();
        tokio::spawn(async move {
            let result = ledger
                .run("append_history", move |conn| {
                    append_history(conn, deployment_id, package_id)
                })
                .await;
            if let Err(e) = result {
                tracing::warn!(
                    request_id = %request_id,
                    deployment_id,
                    package_id,
                    err_code = ExErrorKind::HistoryWrite.code(),
                    error = %e,
                    "Release history append failed"
                );
            }
        })
    }
}

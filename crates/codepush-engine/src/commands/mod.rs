//! Command orchestration layer.
//!
//! `PackageManager` wires the ledger, content store and blob transport into
//! the release and diff engines. Collaborators are injected at construction
//! so tests can substitute in-memory stores.
//!
//! ## Logging Ownership
//!
//! Engines own lifecycle logging (`log_op_start!` / `log_op_end!` /
//! `log_op_error!`); lower layers emit only `tracing::debug!` details.

#![allow(clippy::result_large_err)]

pub mod content;
pub mod diff;
pub mod release;
pub mod session;
pub mod upload;

use crate::config::EngineConfig;
use crate::ledger::Ledger;
use codepush_core::content_store::ContentStore;
use codepush_core::errors::Result;
use codepush_core::model::{
    Deployment, DeploymentVersion, Package, PackageDiff, PackageMetrics, ReleaseParams,
};
use codepush_core::transport::BlobTransport;
use codepush_store::SqliteRepo;
use diff::{DiffEngine, DiffReport};
use release::ReleaseEngine;
use std::sync::Arc;

/// Entry point for release and diff operations
#[derive(Clone)]
pub struct PackageManager {
    ledger: Ledger,
    store: Arc<dyn ContentStore>,
    transport: Arc<dyn BlobTransport>,
    config: EngineConfig,
    release: ReleaseEngine,
    diff: DiffEngine,
}

impl PackageManager {
    pub fn new(
        ledger: Ledger,
        store: Arc<dyn ContentStore>,
        transport: Arc<dyn BlobTransport>,
        config: EngineConfig,
    ) -> Self {
        let release = ReleaseEngine::new(ledger.clone());
        let diff = DiffEngine::new(
            ledger.clone(),
            Arc::clone(&store),
            Arc::clone(&transport),
            config.clone(),
        );
        Self {
            ledger,
            store,
            transport,
            config,
            release,
            diff,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    pub fn transport(&self) -> &dyn BlobTransport {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn release_engine(&self) -> &ReleaseEngine {
        &self.release
    }

    pub fn diff_engine(&self) -> &DiffEngine {
        &self.diff
    }

    pub async fn create_deployment(&self, name: &str, deployment_key: &str) -> Result<Deployment> {
        let name = name.to_string();
        let key = deployment_key.to_string();
        self.ledger
            .run("create_deployment", move |conn| {
                SqliteRepo::create_deployment(conn, &name, &key)
            })
            .await
    }

    pub async fn get_deployment(&self, deployment_id: i64) -> Result<Option<Deployment>> {
        self.ledger
            .run("get_deployment", move |conn| {
                SqliteRepo::get_deployment(conn, deployment_id)
            })
            .await
    }

    pub async fn get_deployment_version(
        &self,
        deployment_id: i64,
        app_version: &str,
    ) -> Result<Option<DeploymentVersion>> {
        let app_version = app_version.to_string();
        self.ledger
            .run("get_deployment_version", move |conn| {
                SqliteRepo::get_deployment_version(conn, deployment_id, &app_version)
            })
            .await
    }

    pub async fn get_package(&self, package_id: i64) -> Result<Option<Package>> {
        self.ledger
            .run("get_package", move |conn| SqliteRepo::get_package(conn, package_id))
            .await
    }

    pub async fn list_packages(&self, deployment_id: i64) -> Result<Vec<Package>> {
        self.ledger
            .run("list_packages", move |conn| {
                SqliteRepo::list_packages(conn, deployment_id)
            })
            .await
    }

    pub async fn list_package_diffs(&self, package_id: i64) -> Result<Vec<PackageDiff>> {
        self.ledger
            .run("list_package_diffs", move |conn| {
                SqliteRepo::list_package_diffs(conn, package_id)
            })
            .await
    }

    /// Install counters of a package, `None` when it has none recorded
    pub async fn get_package_metrics(&self, package_id: i64) -> Result<Option<PackageMetrics>> {
        self.ledger
            .run("get_package_metrics", move |conn| {
                SqliteRepo::get_package_metrics(conn, package_id)
            })
            .await
    }

    pub async fn count_history(&self, deployment_id: i64) -> Result<i64> {
        self.ledger
            .run("count_history", move |conn| {
                SqliteRepo::count_history(conn, deployment_id)
            })
            .await
    }

    /// See [`ReleaseEngine::check_duplicate`]
    pub async fn check_duplicate(
        &self,
        deployment_id: i64,
        app_version: &str,
        package_hash: &str,
    ) -> Result<bool> {
        self.release
            .check_duplicate(deployment_id, app_version, package_hash)
            .await
    }

    /// See [`ReleaseEngine::release`]
    pub async fn release(
        &self,
        deployment_id: i64,
        app_version: &str,
        package_hash: &str,
        manifest_blob_url: &str,
        blob_url: &str,
        params: ReleaseParams,
    ) -> Result<Package> {
        self.release
            .release(
                deployment_id,
                app_version,
                package_hash,
                manifest_blob_url,
                blob_url,
                params,
            )
            .await
    }

    /// See [`DiffEngine::backfill_diffs`]
    pub async fn backfill_diffs(&self, package_id: i64, window: usize) -> Result<DiffReport> {
        self.diff.backfill_diffs(package_id, window).await
    }

    /// See [`DiffEngine::create_diff_packages`]
    pub async fn create_diff_packages(
        &self,
        original: &Package,
        destinations: &[Package],
    ) -> Result<DiffReport> {
        self.diff.create_diff_packages(original, destinations).await
    }
}

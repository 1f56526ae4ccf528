//! Delta diff engine
//!
//! For a target ("original") package and a window of older destination
//! packages, builds one delta bundle per destination that turns the
//! destination's content into the original's:
//!
//! 1. Skip destinations with identical content or an existing diff row
//! 2. Fetch the destination manifest and diff it against the original's
//! 3. Zip changed/new files from the original's content plus `hotcodepush.json`
//! 4. Hash and upload the archive, then record the PackageDiff row
//!
//! Destinations are processed with bounded concurrency over one shared,
//! session-scoped copy of the original's content.

#![allow(clippy::result_large_err)]

use super::content::{fetch_manifest, fetch_original_content};
use super::session::WorkSession;
use crate::config::EngineConfig;
use crate::ledger::Ledger;
use codepush_core::content_store::{ContentStore, StoredContent};
use codepush_core::delta::{DeltaPlan, DELETION_MANIFEST_NAME};
use codepush_core::errors::{ExError, ExErrorKind, ReleaseError, Result};
use codepush_core::hashing::hash_file;
use codepush_core::manifest::Manifest;
use codepush_core::model::{Package, PackageDiff};
use codepush_core::transport::BlobTransport;
use codepush_core::{log_op_end, log_op_error, log_op_start};
use codepush_core_types::RequestId;
use codepush_store::archive::{build_archive, ArchiveEntry};
use codepush_store::SqliteRepo;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Result of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    /// Diff rows recorded by this call, ordered by id
    pub created: Vec<PackageDiff>,
    /// Destination hashes left alone: already diffed, or identical content
    pub skipped: Vec<String>,
}

enum DiffOutcome {
    Created(PackageDiff),
    Skipped(String),
}

fn join_error(op: &'static str, err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op)
        .with_message(format!("blocking task failed: {}", err))
}

#[derive(Clone)]
pub struct DiffEngine {
    ledger: Ledger,
    store: Arc<dyn ContentStore>,
    transport: Arc<dyn BlobTransport>,
    config: EngineConfig,
}

impl DiffEngine {
    pub fn new(
        ledger: Ledger,
        store: Arc<dyn ContentStore>,
        transport: Arc<dyn BlobTransport>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger,
            store,
            transport,
            config,
        }
    }

    /// Diff a package against its `window` most recent predecessors
    ///
    /// Predecessors are packages of the same DeploymentVersion with a
    /// smaller id, newest first. Fewer than `window` predecessors is fine;
    /// none at all is a no-op.
    ///
    /// # Errors
    ///
    /// - `NotFound`: the package does not exist (nothing is written)
    /// - `Storage` / `Network`: first per-destination failure, after all
    ///   other destinations have finished
    pub async fn backfill_diffs(&self, package_id: i64, window: usize) -> Result<DiffReport> {
        let request_id = RequestId::new();
        log_op_start!(
            "backfill_diffs",
            request_id = %request_id,
            package_id = package_id,
            window = window
        );
        let start = std::time::Instant::now();

        let report = self
            .backfill_diffs_impl(package_id, window)
            .await
            .map_err(|e| {
                log_op_error!(
                    "backfill_diffs",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %request_id
                );
                e.with_request_id(request_id.clone())
            })?;

        log_op_end!(
            "backfill_diffs",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            diffs_created = report.created.len()
        );
        Ok(report)
    }

    async fn backfill_diffs_impl(&self, package_id: i64, window: usize) -> Result<DiffReport> {
        let (original, destinations) = self
            .ledger
            .run("backfill_diffs", move |conn| {
                let original = SqliteRepo::get_package(conn, package_id)?
                    .ok_or(ReleaseError::PackageNotFound { package_id })?;
                let destinations = SqliteRepo::list_predecessor_packages(conn, &original, window)?;
                Ok((original, destinations))
            })
            .await?;

        self.create_diff_packages(&original, &destinations).await
    }

    /// Build and record diffs from each destination to `original`
    ///
    /// A failing destination does not stop the others; the first failure is
    /// returned once the fan-out has drained. The session directory is gone
    /// by the time this returns.
    pub async fn create_diff_packages(
        &self,
        original: &Package,
        destinations: &[Package],
    ) -> Result<DiffReport> {
        let request_id = RequestId::new();
        log_op_start!(
            "create_diff_packages",
            request_id = %request_id,
            package_id = original.id,
            destinations = destinations.len()
        );
        let start = std::time::Instant::now();

        let report = self
            .create_diff_packages_impl(original, destinations)
            .await
            .map_err(|e| {
                log_op_error!(
                    "create_diff_packages",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %request_id
                );
                e.with_request_id(request_id.clone())
            })?;

        log_op_end!(
            "create_diff_packages",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            diffs_created = report.created.len()
        );
        Ok(report)
    }

    async fn create_diff_packages_impl(
        &self,
        original: &Package,
        destinations: &[Package],
    ) -> Result<DiffReport> {
        let destinations = distinct_by_content(destinations);
        if destinations.is_empty() {
            return Ok(DiffReport::default());
        }

        let session = WorkSession::new(&self.config.work_dir())?;
        let content = fetch_original_content(
            self.store.as_ref(),
            self.transport.as_ref(),
            &session,
            &original.package_hash,
            &original.blob_url,
        )
        .await?;
        let manifest_path = content.manifest_path.clone();
        let original_manifest = tokio::task::spawn_blocking(move || Manifest::read_from(&manifest_path))
            .await
            .map_err(|e| join_error("read_manifest", e))??;

        let session_ref = &session;
        let content_ref = &content;
        let manifest_ref = &original_manifest;
        let results: Vec<(i64, Result<DiffOutcome>)> = stream::iter(destinations.iter().copied())
            .map(|dest| async move {
                let outcome = self
                    .generate_one_diff(original, content_ref, manifest_ref, dest, session_ref)
                    .await;
                (dest.id, outcome)
            })
            .buffer_unordered(self.config.diff_concurrency.max(1))
            .collect()
            .await;

        let mut report = DiffReport::default();
        let mut first_error = None;
        for (destination_id, result) in results {
            match result {
                Ok(DiffOutcome::Created(diff)) => report.created.push(diff),
                Ok(DiffOutcome::Skipped(hash)) => report.skipped.push(hash),
                Err(e) => {
                    tracing::warn!(
                        package_id = original.id,
                        destination_id,
                        err_code = e.code(),
                        error = %e,
                        "Diff generation failed for destination"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        report.created.sort_by_key(|d| d.id);
        report.skipped.sort();
        Ok(report)
    }

    async fn generate_one_diff(
        &self,
        original: &Package,
        content: &StoredContent,
        original_manifest: &Manifest,
        dest: &Package,
        session: &WorkSession,
    ) -> Result<DiffOutcome> {
        if dest.package_hash == original.package_hash {
            return Ok(DiffOutcome::Skipped(dest.package_hash.clone()));
        }

        let package_id = original.id;
        let dest_hash = dest.package_hash.clone();
        let cached = self
            .ledger
            .run("find_package_diff", move |conn| {
                SqliteRepo::find_package_diff(conn, package_id, &dest_hash)
            })
            .await?;
        if cached.is_some() {
            tracing::debug!(package_id, dest_hash = %dest.package_hash, "Diff already cached");
            return Ok(DiffOutcome::Skipped(dest.package_hash.clone()));
        }

        let dest_manifest =
            fetch_manifest(self.store.as_ref(), self.transport.as_ref(), session, dest).await?;
        let plan = DeltaPlan::between(original_manifest, &dest_manifest);

        let entries: Vec<ArchiveEntry> = plan
            .files
            .iter()
            .map(|path| ArchiveEntry::new(content.content_path.join(path), path))
            .collect();
        let deletion = plan.deletion.to_json_bytes()?;
        let archive_path = session.join(format!("diff_{}_{}.zip", original.id, dest.id));

        let path = archive_path.clone();
        let (size, diff_hash) = tokio::task::spawn_blocking(move || -> Result<(u64, String)> {
            let size = build_archive(
                &path,
                &entries,
                Some((DELETION_MANIFEST_NAME, deletion.as_slice())),
            )?;
            Ok((size, hash_file(&path)?))
        })
        .await
        .map_err(|e| join_error("build_diff_archive", e))??;

        self.transport.upload(&diff_hash, &archive_path).await?;

        let dest_hash = dest.package_hash.clone();
        let diff_size = i64::try_from(size).unwrap_or(i64::MAX);
        let diff = self
            .ledger
            .run("insert_package_diff", move |conn| {
                SqliteRepo::insert_package_diff(conn, package_id, &dest_hash, &diff_hash, diff_size)
            })
            .await?;

        tracing::debug!(
            package_id,
            dest_package_id = dest.id,
            files = plan.files.len(),
            deleted = plan.deletion.deleted_files.len(),
            diff_size,
            "Recorded package diff"
        );
        Ok(DiffOutcome::Created(diff))
    }
}

/// One destination per content hash, the newest package winning
///
/// A rollback can put two packages with the same content in one window;
/// both would map to the same diff row.
fn distinct_by_content(destinations: &[Package]) -> Vec<&Package> {
    let mut newest_first: Vec<&Package> = destinations.iter().collect();
    newest_first.sort_by(|a, b| b.id.cmp(&a.id));
    let mut seen = HashSet::new();
    newest_first.retain(|p| seen.insert(p.package_hash.as_str()));
    newest_first
}

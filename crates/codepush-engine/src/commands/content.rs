//! Content retrieval bridge
//!
//! Turns a (package hash, blob key) pair into extracted local content for
//! the diff engine, preferring content the store already holds.

use super::session::WorkSession;
use codepush_core::content_store::{ContentStore, StoredContent};
use codepush_core::errors::{ExError, ExErrorKind, Result};
use codepush_core::manifest::Manifest;
use codepush_core::model::Package;
use codepush_core::transport::BlobTransport;
use codepush_store::archive::extract_zip;

/// Local handle to a package's extracted content
///
/// Reuses stored content when the store knows the hash; otherwise downloads
/// the bundle blob into the session, extracts it and ingests the result.
pub async fn fetch_original_content(
    store: &dyn ContentStore,
    transport: &dyn BlobTransport,
    session: &WorkSession,
    package_hash: &str,
    blob_url: &str,
) -> Result<StoredContent> {
    if store.exists(package_hash).await? {
        tracing::debug!(package_hash, "Reusing stored content");
        return store.fetch_extracted(package_hash).await;
    }

    let archive = session.join(format!("{}.zip", blob_url));
    transport.download(blob_url, &archive).await?;

    let extracted = session.join(format!("{}_extracted", blob_url));
    let target = extracted.clone();
    tokio::task::spawn_blocking(move || extract_zip(&archive, &target))
        .await
        .map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op("extract_bundle")
                .with_message(e.to_string())
        })??;

    let stored = store.ingest(&extracted).await?;
    if stored.package_hash != package_hash {
        return Err(ExError::new(ExErrorKind::Storage)
            .with_op("fetch_original_content")
            .with_entity_id(package_hash)
            .with_message(format!(
                "bundle {} hashes to {}, not its recorded content hash",
                blob_url, stored.package_hash
            )));
    }
    Ok(stored)
}

/// Manifest of a destination package
///
/// Read from the store when its content is held locally, otherwise the
/// manifest blob is downloaded into the session.
pub async fn fetch_manifest(
    store: &dyn ContentStore,
    transport: &dyn BlobTransport,
    session: &WorkSession,
    package: &Package,
) -> Result<Manifest> {
    let path = if store.exists(&package.package_hash).await? {
        store.fetch_extracted(&package.package_hash).await?.manifest_path
    } else {
        let path = session.join(format!("{}_manifest.json", package.id));
        transport.download(&package.manifest_blob_url, &path).await?;
        path
    };

    tokio::task::spawn_blocking(move || Manifest::read_from(&path))
        .await
        .map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op("read_manifest")
                .with_message(e.to_string())
        })?
}

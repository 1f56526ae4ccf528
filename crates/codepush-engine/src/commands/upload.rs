//! Release-upload flow
//!
//! Validates an uploaded bundle, rejects duplicates before any store work,
//! ingests and uploads the content, then commits the release:
//!
//! 1. `packageInfo` and the bundle file must both be present
//! 2. the bundle must be `application/zip` and target the declared platform
//! 3. the extracted tree's package hash must differ from the current release
//! 4. content is ingested, manifest and bundle blobs uploaded
//! 5. the release is committed with method `Upload`

#![allow(clippy::result_large_err)]

use super::session::WorkSession;
use super::PackageManager;
use codepush_core::errors::{ExError, ExErrorKind, ReleaseError, Result};
use codepush_core::hashing::hash_file;
use codepush_core::model::{Package, ReleaseMethod, ReleaseParams};
use codepush_core::platform::Platform;
use codepush_core::{log_op_end, log_op_error, log_op_start};
use codepush_core_types::RequestId;
use codepush_store::archive::extract_zip;
use codepush_store::cas::manifest_from_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Only accepted upload content type
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Release metadata sent alongside the bundle as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub app_version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_mandatory: bool,
}

impl PackageInfo {
    pub fn from_json(json: &str) -> std::result::Result<Self, ReleaseError> {
        let info: Self = serde_json::from_str(json).map_err(|e| ReleaseError::MalformedPackageInfo {
            reason: e.to_string(),
        })?;
        if info.app_version.trim().is_empty() {
            return Err(ReleaseError::MalformedPackageInfo {
                reason: "appVersion is empty".to_string(),
            });
        }
        Ok(info)
    }
}

/// The uploaded bundle as received from the transport layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub content_type: String,
}

/// Fields of one release request; either may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseUpload {
    pub package_info: Option<String>,
    pub package: Option<UploadedFile>,
}

impl ReleaseUpload {
    pub fn new(package_info: impl Into<String>, path: impl Into<PathBuf>, content_type: &str) -> Self {
        Self {
            package_info: Some(package_info.into()),
            package: Some(UploadedFile {
                path: path.into(),
                content_type: content_type.to_string(),
            }),
        }
    }

    /// Check both fields are present and parse the metadata
    ///
    /// # Errors
    ///
    /// `UploadMalformed` if a field is missing or `packageInfo` is not valid.
    pub fn parse(&self) -> Result<(PackageInfo, &UploadedFile)> {
        let info = self
            .package_info
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ReleaseError::MissingUploadField {
                field: "packageInfo".to_string(),
            })?;
        let package = self.package.as_ref().ok_or_else(|| ReleaseError::MissingUploadField {
            field: "package".to_string(),
        })?;
        Ok((PackageInfo::from_json(info)?, package))
    }
}

/// Facts about an extracted upload, computed before any store work
struct InspectedBundle {
    blob_hash: String,
    size: u64,
    package_hash: String,
}

impl PackageManager {
    /// Release an uploaded bundle to a deployment
    ///
    /// # Errors
    ///
    /// - `UploadMalformed`: missing or malformed fields
    /// - `UnsupportedFormat`: not a zip upload, or not a readable zip
    /// - `InvalidArgument`: unknown platform tag
    /// - `PlatformMismatch`: bundle built for the other platform
    /// - `DuplicateRelease`: identical to the current release
    /// - `NotFound`: deployment does not exist
    /// - `Storage` / `Network`: ingest or blob upload failed
    pub async fn release_upload(
        &self,
        deployment_id: i64,
        upload: &ReleaseUpload,
        release_uid: i64,
        platform: &str,
    ) -> Result<Package> {
        let request_id = RequestId::new();
        log_op_start!(
            "release_upload",
            request_id = %request_id,
            deployment_id = deployment_id,
            platform = platform
        );
        let start = std::time::Instant::now();

        let package = self
            .release_upload_impl(deployment_id, upload, release_uid, platform)
            .await
            .map_err(|e| {
                log_op_error!(
                    "release_upload",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %request_id
                );
                e.with_request_id(request_id.clone())
            })?;

        log_op_end!(
            "release_upload",
            duration_ms = start.elapsed().as_millis() as u64,
            request_id = %request_id,
            package_id = package.id,
            label = %package.label
        );
        Ok(package)
    }

    async fn release_upload_impl(
        &self,
        deployment_id: i64,
        upload: &ReleaseUpload,
        release_uid: i64,
        platform: &str,
    ) -> Result<Package> {
        let (info, file) = upload.parse()?;
        if file.content_type != ZIP_CONTENT_TYPE {
            return Err(ReleaseError::UnsupportedContentType {
                content_type: file.content_type.clone(),
            }
            .into());
        }
        let platform = Platform::parse(platform)?;

        let session = WorkSession::new(&self.config().work_dir())?;
        let bundle_dir = session.join("bundle");
        let inspected = inspect_bundle(file.path.clone(), bundle_dir.clone(), platform).await?;

        if self
            .release_engine()
            .check_duplicate(deployment_id, &info.app_version, &inspected.package_hash)
            .await?
        {
            return Err(ReleaseError::Duplicate {
                deployment_id,
                app_version: info.app_version.clone(),
            }
            .into());
        }

        let stored = self.store().ingest(&bundle_dir).await?;
        let manifest_file = stored.manifest_path.clone();
        let manifest_hash = tokio::task::spawn_blocking(move || hash_file(&manifest_file))
            .await
            .map_err(|e| blocking_failed("hash_manifest", e))??;

        let transport = self.transport();
        futures::try_join!(
            transport.upload(&manifest_hash, &stored.manifest_path),
            transport.upload(&inspected.blob_hash, &file.path)
        )?;

        let params = ReleaseParams {
            release_method: ReleaseMethod::Upload,
            release_uid,
            is_mandatory: info.is_mandatory,
            size: i64::try_from(inspected.size).unwrap_or(i64::MAX),
            description: info.description.clone(),
            ..Default::default()
        };

        self.release_engine()
            .release(
                deployment_id,
                &info.app_version,
                &stored.package_hash,
                &manifest_hash,
                &inspected.blob_hash,
                params,
            )
            .await
    }
}

fn blocking_failed(op: &'static str, err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op)
        .with_message(format!("blocking task failed: {}", err))
}

/// Hash, extract and platform-check an uploaded zip
async fn inspect_bundle(
    archive: PathBuf,
    bundle_dir: PathBuf,
    platform: Platform,
) -> Result<InspectedBundle> {
    tokio::task::spawn_blocking(move || -> Result<InspectedBundle> {
        let blob_hash = hash_file(&archive)?;
        let size = std::fs::metadata(&archive)
            .map_err(|e| codepush_core::errors::io_error("inspect_bundle", e))?
            .len();
        extract_zip(&archive, &bundle_dir)?;
        platform.verify_bundle(&bundle_dir)?;
        let package_hash = manifest_from_dir(&bundle_dir)?.package_hash()?;
        Ok(InspectedBundle {
            blob_hash,
            size,
            package_hash,
        })
    })
    .await
    .map_err(|e| blocking_failed("inspect_bundle", e))?
}

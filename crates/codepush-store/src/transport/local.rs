//! Directory-backed blob transport

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, join_error, Result};
use async_trait::async_trait;
use codepush_core::errors::{ExError, ExErrorKind};
use codepush_core::transport::BlobTransport;
use std::path::{Path, PathBuf};

/// Blob store rooted at a local directory; blob `k` lives at `<dir>/<k>`
#[derive(Debug, Clone)]
pub struct LocalBlobTransport {
    dir: PathBuf,
}

impl LocalBlobTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn blob_path(&self, blob_key: &str) -> PathBuf {
        self.dir.join(blob_key)
    }
}

#[async_trait]
impl BlobTransport for LocalBlobTransport {
    async fn download(&self, blob_key: &str, dest: &Path) -> Result<()> {
        let src = self.blob_path(blob_key);
        if !tokio::fs::try_exists(&src).await.unwrap_or(false) {
            return Err(ExError::new(ExErrorKind::NotFound)
                .with_op("download_blob")
                .with_entity_id(blob_key)
                .with_message(format!("blob not found at {}", src.display())));
        }
        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| io_error("download_blob", e))?;
        Ok(())
    }

    async fn upload(&self, blob_key: &str, src: &Path) -> Result<()> {
        let dir = self.dir.clone();
        let target = self.blob_path(blob_key);
        let src = src.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&dir).map_err(|e| io_error("upload_blob", e))?;
            let mut staged = tempfile::Builder::new()
                .prefix(".upload_")
                .tempfile_in(&dir)
                .map_err(|e| io_error("upload_blob", e))?;
            let mut source = std::fs::File::open(&src).map_err(|e| io_error("upload_blob", e))?;
            std::io::copy(&mut source, staged.as_file_mut())
                .map_err(|e| io_error("upload_blob", e))?;
            staged
                .persist(&target)
                .map_err(|e| io_error("upload_blob", e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| join_error("upload_blob", e))??;

        tracing::debug!(blob_key, "Stored blob");
        Ok(())
    }
}

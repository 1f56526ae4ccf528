//! Blob transport collaborator interface
//!
//! Moves opaque blobs between local files and remote storage by key. Keys
//! are content hashes, so uploading the same key twice is harmless.

use crate::errors::{io_error, ExError, ExErrorKind, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Fetch the blob under `blob_key` into the file at `dest`
    async fn download(&self, blob_key: &str, dest: &Path) -> Result<()>;

    /// Store the file at `src` under `blob_key`
    async fn upload(&self, blob_key: &str, src: &Path) -> Result<()>;
}

/// In-process transport used by tests and dry runs
#[derive(Default)]
pub struct MemoryBlobTransport {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    fail_uploads: AtomicBool,
}

impl MemoryBlobTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob as if it had been uploaded earlier
    pub fn insert(&self, blob_key: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut blobs) = self.blobs.lock() {
            blobs.insert(blob_key.into(), bytes);
        }
    }

    pub fn get(&self, blob_key: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .ok()
            .and_then(|blobs| blobs.get(blob_key).cloned())
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .lock()
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// Number of upload calls that succeeded
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Make every subsequent upload fail with a network error
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    fn poisoned() -> ExError {
        ExError::new(ExErrorKind::Internal).with_message("blob map lock poisoned")
    }
}

#[async_trait]
impl BlobTransport for MemoryBlobTransport {
    async fn download(&self, blob_key: &str, dest: &Path) -> Result<()> {
        let bytes = self.get(blob_key).ok_or_else(|| {
            ExError::new(ExErrorKind::NotFound)
                .with_op("download_blob")
                .with_entity_id(blob_key)
                .with_message("blob not found")
        })?;
        tokio::fs::write(dest, bytes)
            .await
            .map_err(|e| io_error("download_blob", e))
    }

    async fn upload(&self, blob_key: &str, src: &Path) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ExError::new(ExErrorKind::Network)
                .with_op("upload_blob")
                .with_entity_id(blob_key)
                .with_message("upload rejected"));
        }
        let bytes = tokio::fs::read(src)
            .await
            .map_err(|e| io_error("upload_blob", e))?;
        self.blobs
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(blob_key.to_string(), bytes);
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        let dest = dir.path().join("dest.bin");
        std::fs::write(&src, b"payload").unwrap();

        let transport = MemoryBlobTransport::new();
        transport.upload("abc", &src).await.unwrap();
        transport.download("abc", &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert_eq!(transport.upload_count(), 1);
        assert_eq!(transport.keys(), vec!["abc"]);
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let dir = TempDir::new().unwrap();
        let transport = MemoryBlobTransport::new();
        let err = transport
            .download("nope", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failing_uploads() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.bin");
        std::fs::write(&src, b"payload").unwrap();

        let transport = MemoryBlobTransport::new();
        transport.set_fail_uploads(true);
        let err = transport.upload("abc", &src).await.unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Network);
        assert_eq!(transport.upload_count(), 0);
    }
}

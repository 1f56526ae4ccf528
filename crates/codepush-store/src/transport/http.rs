//! HTTP blob transport
//!
//! Downloads blob `k` with `GET {download_url}/{k}`; uploads with
//! `PUT {upload_url}/{k}` when an upload endpoint is configured.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use async_trait::async_trait;
use codepush_core::errors::{ExError, ExErrorKind};
use codepush_core::transport::BlobTransport;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

fn network_error(op: &str, url: &str, err: reqwest::Error) -> ExError {
    ExError::new(ExErrorKind::Network)
        .with_op(op.to_string())
        .with_entity_id(url)
        .with_message(err.to_string())
}

/// Blob transport over a distribution endpoint
pub struct HttpBlobTransport {
    download_url: String,
    upload_url: Option<String>,
    http: reqwest::Client,
}

impl HttpBlobTransport {
    /// Create a transport; `timeout` bounds every request
    pub fn new(download_url: &str, upload_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| network_error("http_client", download_url, e))?;
        Ok(Self {
            download_url: download_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.map(|u| u.trim_end_matches('/').to_string()),
            http,
        })
    }

    pub fn download_url_for(&self, blob_key: &str) -> String {
        format!("{}/{}", self.download_url, blob_key)
    }

    pub fn upload_url_for(&self, blob_key: &str) -> Option<String> {
        self.upload_url
            .as_ref()
            .map(|base| format!("{}/{}", base, blob_key))
    }
}

#[async_trait]
impl BlobTransport for HttpBlobTransport {
    async fn download(&self, blob_key: &str, dest: &Path) -> Result<()> {
        let url = self.download_url_for(blob_key);
        let mut resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| network_error("download_blob", &url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let kind = if status == reqwest::StatusCode::NOT_FOUND {
                ExErrorKind::NotFound
            } else {
                ExErrorKind::Network
            };
            return Err(ExError::new(kind)
                .with_op("download_blob")
                .with_entity_id(url)
                .with_message(format!("GET failed ({})", status)));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| io_error("download_blob", e))?;
        let mut size_bytes = 0usize;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| network_error("download_blob", &url, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| io_error("download_blob", e))?;
            size_bytes += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| io_error("download_blob", e))?;

        tracing::debug!(url = %url, size_bytes, "Downloaded blob");
        Ok(())
    }

    async fn upload(&self, blob_key: &str, src: &Path) -> Result<()> {
        let Some(url) = self.upload_url_for(blob_key) else {
            return Err(ExError::new(ExErrorKind::Storage)
                .with_op("upload_blob")
                .with_entity_id(blob_key)
                .with_message("no upload endpoint configured"));
        };

        let body = tokio::fs::read(src)
            .await
            .map_err(|e| io_error("upload_blob", e))?;
        let resp = self
            .http
            .put(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| network_error("upload_blob", &url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ExError::new(ExErrorKind::Storage)
                .with_op("upload_blob")
                .with_entity_id(url)
                .with_message(format!("PUT failed ({}): {}", status, text)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{Path as UrlPath, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Blobs = Arc<Mutex<HashMap<String, Vec<u8>>>>;

    async fn get_blob(
        State(blobs): State<Blobs>,
        UrlPath(key): UrlPath<String>,
    ) -> std::result::Result<Vec<u8>, StatusCode> {
        blobs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(StatusCode::NOT_FOUND)
    }

    async fn put_blob(
        State(blobs): State<Blobs>,
        UrlPath(key): UrlPath<String>,
        body: Bytes,
    ) -> StatusCode {
        blobs.lock().unwrap().insert(key, body.to_vec());
        StatusCode::CREATED
    }

    /// Serve a blob directory on an ephemeral port, returns its base URL
    async fn spawn_blob_server(blobs: Blobs) -> String {
        let app = Router::new()
            .route("/blobs/:key", get(get_blob).put(put_blob))
            .with_state(blobs);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}/blobs", addr)
    }

    #[tokio::test]
    async fn test_upload_then_download_through_server() {
        let blobs: Blobs = Arc::default();
        let base = spawn_blob_server(blobs.clone()).await;
        let transport = HttpBlobTransport::new(&base, Some(&base), Duration::from_secs(5)).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("bundle.zip");
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &payload).unwrap();

        transport.upload("abc", &src).await.unwrap();
        let dest = dir.path().join("fetched.zip");
        transport.download("abc", &dest).await.unwrap();

        assert_eq!(blobs.lock().unwrap().get("abc"), Some(&payload));
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_download_missing_blob_is_not_found() {
        let base = spawn_blob_server(Blobs::default()).await;
        let transport = HttpBlobTransport::new(&base, None, Duration::from_secs(5)).unwrap();
        let dir = tempfile::TempDir::new().unwrap();

        let err = transport
            .download("missing", &dir.path().join("out"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert!(err.entity_id().unwrap().ends_with("/blobs/missing"));
    }

    #[test]
    fn test_urls_join_without_double_slash() {
        let transport = HttpBlobTransport::new(
            "http://127.0.0.1:3000/download/",
            Some("http://127.0.0.1:3000/upload"),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            transport.download_url_for("abc"),
            "http://127.0.0.1:3000/download/abc"
        );
        assert_eq!(
            transport.upload_url_for("abc").as_deref(),
            Some("http://127.0.0.1:3000/upload/abc")
        );
    }

    #[tokio::test]
    async fn test_upload_without_endpoint_is_storage_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("b");
        std::fs::write(&src, b"x").unwrap();
        let transport =
            HttpBlobTransport::new("http://127.0.0.1:3000/download", None, Duration::from_secs(5))
                .unwrap();

        let err = transport.upload("abc", &src).await.unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Storage);
    }
}

// Shared fixtures for engine integration tests

#![allow(dead_code)]

use codepush_core::model::Package;
use codepush_core::MemoryBlobTransport;
use codepush_engine::{EngineConfig, Ledger, PackageManager, ReleaseUpload};
use codepush_store::archive::{build_archive, extract_zip, ArchiveEntry};
use codepush_store::FsContentStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

pub struct Harness {
    pub dir: TempDir,
    pub manager: PackageManager,
    pub transport: Arc<MemoryBlobTransport>,
    pub ledger: Ledger,
    pub config: EngineConfig,
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let ledger = Ledger::open_in_memory().expect("ledger");
        let transport = Arc::new(MemoryBlobTransport::new());
        let config = EngineConfig {
            work_dir: Some(dir.path().join("work")),
            ..EngineConfig::default()
        };
        let manager = PackageManager::new(
            ledger.clone(),
            Arc::new(FsContentStore::new(dir.path().join("cas"))),
            transport.clone(),
            config.clone(),
        );
        Self {
            dir,
            manager,
            transport,
            ledger,
            config,
        }
    }

    /// A second manager sharing ledger and blobs but with an empty content store
    pub fn cold_manager(&self) -> PackageManager {
        PackageManager::new(
            self.ledger.clone(),
            Arc::new(FsContentStore::new(self.dir.path().join("cold_cas"))),
            self.transport.clone(),
            self.config.clone(),
        )
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Session directories still present under the work dir
    pub fn leftover_sessions(&self) -> usize {
        match std::fs::read_dir(self.work_dir()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("codepush_"))
                .count(),
            Err(_) => 0,
        }
    }

    /// Write `files` into a fresh zip under the harness dir
    pub fn zip(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let src = self.dir.path().join("src").join(name);
        let mut entries = Vec::new();
        for (path, body) in files {
            let full = src.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(&full, body).unwrap();
            entries.push(ArchiveEntry::new(&full, path));
        }
        let archive = self.dir.path().join(format!("{}.zip", name));
        build_archive(&archive, &entries, None).unwrap();
        archive
    }

    pub async fn deployment(&self) -> i64 {
        self.manager
            .create_deployment("Production", "prod-key")
            .await
            .unwrap()
            .id
    }

    /// Release an iOS bundle with the given files
    pub async fn release_files(
        &self,
        deployment_id: i64,
        app_version: &str,
        name: &str,
        files: &[(&str, &str)],
    ) -> codepush_core::Result<Package> {
        let archive = self.zip(name, files);
        let upload = ReleaseUpload::new(
            format!(r#"{{"appVersion":"{}","description":"{}"}}"#, app_version, name),
            archive,
            "application/zip",
        );
        self.manager
            .release_upload(deployment_id, &upload, 1, "ios")
            .await
    }

    /// Entries of a stored blob archive, name -> contents
    pub fn blob_entries(&self, blob_key: &str) -> BTreeMap<String, String> {
        let bytes = self.transport.get(blob_key).expect("blob stored");
        let scratch = TempDir::new().unwrap();
        let archive = scratch.path().join("blob.zip");
        std::fs::write(&archive, bytes).unwrap();
        let out = scratch.path().join("out");
        extract_zip(&archive, &out).unwrap();
        read_tree(&out)
    }
}

pub fn read_tree(root: &Path) -> BTreeMap<String, String> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (rel, std::fs::read_to_string(entry.path()).unwrap())
        })
        .collect()
}

/// Poll until the deployment's history reaches `expected` entries
pub async fn wait_for_history(manager: &PackageManager, deployment_id: i64, expected: i64) -> i64 {
    let mut count = 0;
    for _ in 0..100 {
        count = manager.count_history(deployment_id).await.unwrap();
        if count >= expected {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    count
}

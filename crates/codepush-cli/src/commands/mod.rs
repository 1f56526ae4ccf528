//! Subcommands and the shared workspace wiring

pub mod deployment;
pub mod diff;
pub mod init;
pub mod packages;
pub mod release;

use clap::Args;
use codepush_core::transport::BlobTransport;
use codepush_engine::{EngineConfig, Ledger, PackageManager};
use codepush_store::{FsContentStore, HttpBlobTransport, LocalBlobTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Locations shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Engine configuration file (TOML); defaults apply when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = ".codepush/ledger.db")]
    pub db: PathBuf,

    /// Extracted-content store
    #[arg(long, global = true, default_value = ".codepush/cas")]
    pub cas: PathBuf,

    /// Local blob directory, used when the config has no upload_url
    #[arg(long, global = true, default_value = ".codepush/blobs")]
    pub blobs: PathBuf,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => Ok(EngineConfig::load(path)?),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Open the ledger and assemble a manager over the configured stores
    pub fn open_manager(&self) -> Result<PackageManager, Box<dyn std::error::Error>> {
        let config = self.load_config()?;
        ensure_parent(&self.db)?;
        let ledger = Ledger::open(&self.db, config.busy_timeout())?;

        let transport: Arc<dyn BlobTransport> = match &config.upload_url {
            Some(upload_url) => Arc::new(HttpBlobTransport::new(
                &config.download_url,
                Some(upload_url.as_str()),
                config.request_timeout(),
            )?),
            None => Arc::new(LocalBlobTransport::new(&self.blobs)),
        };

        Ok(PackageManager::new(
            ledger,
            Arc::new(FsContentStore::new(&self.cas)),
            transport,
            config,
        ))
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! download_url = "https://cdn.example.com/download"
//! diff_concurrency = 4
//! ```

use codepush_core::errors::{ExError, ExErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distribution endpoint; blob `k` is fetched from `{download_url}/{k}`
    pub download_url: String,
    /// Optional upload endpoint; blob `k` is stored with `PUT {upload_url}/{k}`
    pub upload_url: Option<String>,
    /// Parent of per-session temp dirs (system temp dir when unset)
    pub work_dir: Option<PathBuf>,
    /// Max destinations diffed at once in one fan-out
    pub diff_concurrency: usize,
    /// Default predecessor window for diff backfills
    pub diff_window: usize,
    pub request_timeout_secs: u64,
    pub busy_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_url: "http://127.0.0.1:3000/download".to_string(),
            upload_url: None,
            work_dir: None,
            diff_concurrency: 2,
            diff_window: 3,
            request_timeout_secs: 300,
            busy_timeout_ms: 5000,
        }
    }
}

impl EngineConfig {
    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| config_error(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.diff_concurrency == 0 {
            return Err(config_error("diff_concurrency must be at least 1"));
        }
        if self.download_url.trim().is_empty() {
            return Err(config_error("download_url must not be empty"));
        }
        Ok(())
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.diff_concurrency, 2);
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            download_url = "https://cdn.example.com/download"
            diff_concurrency = 4
            work_dir = "/var/tmp/codepush"
            "#,
        )
        .unwrap();

        assert_eq!(config.download_url, "https://cdn.example.com/download");
        assert_eq!(config.diff_concurrency, 4);
        assert_eq!(config.work_dir(), PathBuf::from("/var/tmp/codepush"));
        assert_eq!(config.diff_window, 3);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = EngineConfig::from_toml_str("diff_concurrency = 0").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = EngineConfig::from_toml_str("diff_concurrency = \"many\"").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/codepush.toml")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }
}

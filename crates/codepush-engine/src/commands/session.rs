//! Per-session working directories
//!
//! Each release upload or diff fan-out gets a private `codepush_*` temp
//! directory that is removed when the session is dropped, whichever path
//! the operation exits by.

use codepush_core::errors::{io_error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct WorkSession {
    dir: TempDir,
}

impl WorkSession {
    /// Create a session directory below `parent`
    pub fn new(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent).map_err(|e| io_error("create_session", e))?;
        let dir = tempfile::Builder::new()
            .prefix("codepush_")
            .tempdir_in(parent)
            .map_err(|e| io_error("create_session", e))?;
        tracing::debug!(path = %dir.path().display(), "Opened work session");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let session = WorkSession::new(parent.path()).unwrap();
        let path = session.path().to_path_buf();
        std::fs::write(session.join("scratch"), b"x").unwrap();

        assert!(path.file_name().unwrap().to_string_lossy().starts_with("codepush_"));
        drop(session);
        assert!(!path.exists());
    }
}

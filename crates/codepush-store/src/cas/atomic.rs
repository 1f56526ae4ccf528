//! Atomic publish primitives
//!
//! Content is staged in a sibling temp directory and renamed into place, so
//! readers never observe a half-written entry.

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Move a fully staged directory to `target`
///
/// Returns `Ok(false)` when another writer published `target` first; the
/// staged copy is left for the caller to discard.
pub fn publish_dir(staged: &Path, target: &Path) -> Result<bool> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_cas_dir", e))?;
    }

    match fs::rename(staged, target) {
        Ok(()) => Ok(true),
        Err(_) if target.is_dir() => Ok(false),
        Err(e) => Err(io_error("rename_cas_entry", e)),
    }
}

/// Recursively copy the files of `src` into `dest`
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| io_error("walk_content", e.into()))?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_error("copy_content", e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| io_error("copy_content", e))?;
        }
    }
    Ok(())
}

//! Zip archiver
//!
//! Builds delta bundles and extracts uploaded bundles. Entries are written
//! in caller order with `/` separators, deflate compression and a fixed
//! 1980-01-01 timestamp, so identical inputs yield identical archive bytes.

#![allow(clippy::result_large_err)]

use codepush_core::errors::{ExError, ExErrorKind};
use codepush_core::manifest::normalize_path;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive io failed: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] ZipError),

    #[error("entry '{name}' escapes the extraction directory")]
    UnsafePath { name: String },
}

impl From<ArchiveError> for ExError {
    fn from(err: ArchiveError) -> Self {
        let kind = match &err {
            ArchiveError::Zip(ZipError::InvalidArchive(_))
            | ArchiveError::Zip(ZipError::UnsupportedArchive(_))
            | ArchiveError::UnsafePath { .. } => ExErrorKind::UnsupportedFormat,
            ArchiveError::Io(_) => ExErrorKind::Io,
            ArchiveError::Zip(_) => ExErrorKind::Storage,
        };
        ExError::new(kind)
            .with_op("archive")
            .with_message(err.to_string())
    }
}

/// A file on disk and the path it takes inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub archive_path: String,
}

impl ArchiveEntry {
    pub fn new(source: impl Into<PathBuf>, archive_path: &str) -> Self {
        Self {
            source: source.into(),
            archive_path: normalize_path(archive_path),
        }
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Write `entries`, then the optional named in-memory entry, to `dest`
///
/// Returns the archive size in bytes.
pub fn build_archive(
    dest: &Path,
    entries: &[ArchiveEntry],
    extra: Option<(&str, &[u8])>,
) -> Result<u64, ArchiveError> {
    let mut writer = ZipWriter::new(File::create(dest)?);

    for entry in entries {
        writer.start_file(entry.archive_path.as_str(), entry_options())?;
        let mut source = File::open(&entry.source)?;
        io::copy(&mut source, &mut writer)?;
    }

    if let Some((name, bytes)) = extra {
        writer.start_file(normalize_path(name), entry_options())?;
        writer.write_all(bytes)?;
    }

    let file = writer.finish()?;
    Ok(file.metadata()?.len())
}

/// Extract a zip file into `target`, returning the number of files written
///
/// Entries whose names would land outside `target` are refused.
pub fn extract_zip(archive: &Path, target: &Path) -> Result<usize, ArchiveError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut files = 0;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ArchiveError::UnsafePath {
                name: entry.name().to_string(),
            });
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    Ok(files)
}

/// Names of all entries in archive order
pub fn entry_names(archive: &Path) -> Result<Vec<String>, ArchiveError> {
    let zip = ZipArchive::new(File::open(archive)?)?;
    Ok(zip.file_names().map(str::to_string).collect())
}

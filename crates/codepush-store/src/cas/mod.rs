//! Content-Addressable Storage (CAS) for extracted bundles
//!
//! Provides:
//! - Filesystem store keyed by package hash
//! - Manifest computation over a directory tree
//! - Sharding by first 2 hex chars of the hash

mod atomic;
mod fs_store;
mod sharding;

pub use fs_store::{manifest_from_dir, FsContentStore, MANIFEST_FILE_NAME};

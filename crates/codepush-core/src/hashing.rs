//! Content hashing
//!
//! SHA-256, lower-case hex. Used for file hashes inside manifests, for the
//! package hash (hash of the canonical manifest JSON), and for blob keys.

use crate::errors::{io_error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Hash a byte slice
pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Hash a file by streaming its contents
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| io_error("hash_file", e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| io_error("hash_file", e))?;
    Ok(hex::encode(hasher.finalize()))
}

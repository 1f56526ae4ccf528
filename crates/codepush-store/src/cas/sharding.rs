//! Sharding logic for CAS
//!
//! Entries live under a subdirectory named after the first 2 hex characters
//! of their hash to keep directory sizes bounded.

use std::path::{Path, PathBuf};

/// Entry directory for a hash
///
/// For hash "abc123...", returns "<root>/ab/abc123..."
pub fn shard_dir(root: &Path, hash: &str) -> PathBuf {
    let shard = hash.get(..2).unwrap_or(hash);
    root.join(shard).join(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_dir() {
        let path = shard_dir(Path::new("/cas"), "abc123def456");
        assert_eq!(path, PathBuf::from("/cas/ab/abc123def456"));
    }

    #[test]
    fn test_short_hash() {
        let path = shard_dir(Path::new("/cas"), "a");
        assert_eq!(path, PathBuf::from("/cas/a/a"));
    }
}

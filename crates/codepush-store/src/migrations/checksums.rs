//! Checksum validation for migrations
//!
//! Detects edits to migrations that were already applied

use codepush_core::hashing::hash_bytes;

/// SHA256 checksum of migration SQL
pub fn compute_checksum(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

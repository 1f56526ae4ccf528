//! Error handling for codepush-store
//!
//! Wraps codepush-core ExError with store-specific helpers

use codepush_core::errors::{ExError, ExErrorKind};

pub use codepush_core::errors::io_error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a content-missing error
pub fn content_missing(package_hash: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("fetch_extracted")
        .with_entity_id(package_hash)
        .with_message(format!("no stored content for hash {}", package_hash))
}

/// Create a database error from rusqlite::Error
///
/// Busy and locked failures surface as `Concurrency` so callers can tell a
/// lost write race from a broken ledger.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(ffi, _)
            if matches!(
                ffi.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            ExErrorKind::Concurrency
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an internal error from a failed blocking task
pub fn join_error(op: &str, err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op.to_string())
        .with_message(format!("blocking task failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_concurrency() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(from_rusqlite(err).kind(), ExErrorKind::Concurrency);
    }

    #[test]
    fn test_other_failures_map_to_persistence() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert_eq!(from_rusqlite(err).kind(), ExErrorKind::Persistence);
    }
}

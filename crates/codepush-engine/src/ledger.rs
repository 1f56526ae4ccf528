//! Shared ledger handle
//!
//! Wraps one SQLite connection behind a mutex. Every call runs on the
//! blocking pool so async callers suspend instead of stalling the runtime.

#![allow(clippy::result_large_err)]

use codepush_core::errors::{ExError, ExErrorKind, Result};
use codepush_store::db;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct Ledger {
    conn: Arc<Mutex<Connection>>,
}

impl Ledger {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Open (creating and migrating if needed) a ledger file
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        Ok(Self::new(db::open_ledger(path, busy_timeout)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(db::open_ledger_in_memory()?))
    }

    /// Run `f` against the connection on the blocking pool
    pub async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                ExError::new(ExErrorKind::Internal)
                    .with_op(op)
                    .with_message("ledger lock poisoned")
            })?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op(op)
                .with_message(format!("ledger task failed: {}", e))
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepush_store::SqliteRepo;

    #[tokio::test]
    async fn test_run_round_trip() {
        let ledger = Ledger::open_in_memory().unwrap();
        let created = ledger
            .run("create_deployment", |conn| {
                SqliteRepo::create_deployment(conn, "Production", "k")
            })
            .await
            .unwrap();

        let id = created.id;
        let fetched = ledger
            .run("get_deployment", move |conn| SqliteRepo::get_deployment(conn, id))
            .await
            .unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let ledger = Ledger::open_in_memory().unwrap();
        let err = ledger
            .run("find_or_create_version", |conn| {
                SqliteRepo::find_or_create_version(conn, 1, "1.0")
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }
}

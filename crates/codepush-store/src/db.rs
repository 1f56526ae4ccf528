//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Busy timeout applied when none is configured
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection for ledger use
///
/// Foreign keys on, WAL journal, and a busy timeout so that conflicting
/// writers wait instead of failing immediately.
pub fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout).map_err(from_rusqlite)?;
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;
    Ok(())
}

/// Open, configure and migrate a ledger file
pub fn open_ledger<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Connection> {
    let mut conn = open(path)?;
    configure(&conn, busy_timeout)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

/// Open, configure and migrate an in-memory ledger
pub fn open_ledger_in_memory() -> Result<Connection> {
    let mut conn = open_in_memory()?;
    configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

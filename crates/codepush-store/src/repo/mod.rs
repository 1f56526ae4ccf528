//! Repository layer
//!
//! Typed reads and writes over the release ledger tables

mod hydration;
mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;

//! Release ledger operations
//!
//! The dedup check, the atomic release transaction and the history append.

mod dedup;
mod persist;

pub use dedup::matches_current_release;
pub use persist::{append_history, commit_release, ReleaseRecord};

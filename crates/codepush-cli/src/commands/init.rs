//! Workspace initialization

use super::{ensure_parent, CliResult, GlobalArgs};
use codepush_engine::Ledger;

pub fn execute(global: &GlobalArgs) -> CliResult {
    let config = global.load_config()?;
    ensure_parent(&global.db)?;
    std::fs::create_dir_all(&global.cas)?;
    std::fs::create_dir_all(&global.blobs)?;
    Ledger::open(&global.db, config.busy_timeout())?;

    println!("Initialized ledger at {}", global.db.display());
    Ok(())
}

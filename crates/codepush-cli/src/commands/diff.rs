//! Diff backfill command

use super::{CliResult, GlobalArgs};
use clap::Args;

#[derive(Debug, Args)]
pub struct DiffArgs {
    #[arg(long)]
    pub package: i64,

    /// Predecessors to diff against (config `diff_window` when omitted)
    #[arg(long)]
    pub window: Option<usize>,
}

pub async fn execute(global: &GlobalArgs, args: DiffArgs) -> CliResult {
    let manager = global.open_manager()?;
    let window = args.window.unwrap_or(manager.config().diff_window);

    let report = manager.backfill_diffs(args.package, window).await?;

    println!("Diffs for package {}:", args.package);
    for diff in &report.created {
        println!(
            "  created against {} -> {} ({} bytes)",
            diff.diff_against_package_hash, diff.diff_blob_url, diff.diff_size
        );
    }
    for hash in &report.skipped {
        println!("  skipped {}", hash);
    }
    if report.created.is_empty() && report.skipped.is_empty() {
        println!("  no predecessors");
    }
    Ok(())
}

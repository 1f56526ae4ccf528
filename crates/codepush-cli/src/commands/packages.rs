//! Package listing

use super::{CliResult, GlobalArgs};
use clap::Args;

#[derive(Debug, Args)]
pub struct PackagesArgs {
    #[arg(long)]
    pub deployment: i64,
}

pub async fn execute(global: &GlobalArgs, args: PackagesArgs) -> CliResult {
    let manager = global.open_manager()?;
    let packages = manager.list_packages(args.deployment).await?;

    if packages.is_empty() {
        println!("No packages for deployment {}", args.deployment);
        return Ok(());
    }

    for package in packages {
        println!(
            "{} {} {} ({}, {} bytes)",
            package.id,
            package.label,
            package.package_hash,
            package.release_method.as_str(),
            package.size
        );
        for diff in manager.list_package_diffs(package.id).await? {
            println!(
                "    diff from {} -> {}",
                diff.diff_against_package_hash, diff.diff_blob_url
            );
        }
    }
    Ok(())
}

//! Release command

use super::{CliResult, GlobalArgs};
use clap::Args;
use codepush_engine::commands::upload::{PackageInfo, ZIP_CONTENT_TYPE};
use codepush_engine::ReleaseUpload;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReleaseArgs {
    #[arg(long)]
    pub deployment: i64,

    /// Zipped bundle to release
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long)]
    pub app_version: String,

    /// Target platform: ios or android
    #[arg(long)]
    pub platform: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub mandatory: bool,

    /// Releasing user id recorded on the package
    #[arg(long, default_value_t = 0)]
    pub uid: i64,

    /// Build diffs against this many predecessors after releasing
    #[arg(long)]
    pub diff_window: Option<usize>,
}

pub async fn execute(global: &GlobalArgs, args: ReleaseArgs) -> CliResult {
    let manager = global.open_manager()?;

    let info = PackageInfo {
        app_version: args.app_version,
        description: args.description,
        is_mandatory: args.mandatory,
    };
    let content_type = match args.file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("zip") => ZIP_CONTENT_TYPE,
        _ => "application/octet-stream",
    };
    let upload = ReleaseUpload::new(serde_json::to_string(&info)?, &args.file, content_type);

    let package = manager
        .release_upload(args.deployment, &upload, args.uid, &args.platform)
        .await?;

    println!("Package released:");
    println!("  id: {}", package.id);
    println!("  label: {}", package.label);
    println!("  package_hash: {}", package.package_hash);
    println!("  blob_url: {}", package.blob_url);
    println!("  size: {}", package.size);

    if let Some(window) = args.diff_window {
        let report = manager.backfill_diffs(package.id, window).await?;
        println!("  diffs created: {}", report.created.len());
    }
    Ok(())
}

//! Codepush CLI
//!
//! Command-line interface for releasing bundles and building delta diffs

use clap::{Parser, Subcommand};
use codepush_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "codepush")]
#[command(about = "Codepush - OTA package releases and delta diffs", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    /// Human-readable debug logs on stdout
    #[arg(long, global = true, conflicts_with = "log_json")]
    verbose: bool,

    /// JSON structured logs on stdout
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the ledger and store directories
    Init,
    /// Deployment operations
    Deployment(commands::deployment::DeploymentArgs),
    /// Release a zipped bundle to a deployment
    Release(commands::release::ReleaseArgs),
    /// Build delta diffs for a package
    Diff(commands::diff::DiffArgs),
    /// List packages and their diffs
    Packages(commands::packages::PackagesArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init(Profile::Development);
    } else if cli.log_json {
        init(Profile::Production);
    }

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli.global),
        Commands::Deployment(args) => commands::deployment::execute(&cli.global, args).await,
        Commands::Release(args) => commands::release::execute(&cli.global, args).await,
        Commands::Diff(args) => commands::diff::execute(&cli.global, args).await,
        Commands::Packages(args) => commands::packages::execute(&cli.global, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

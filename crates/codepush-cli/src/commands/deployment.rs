//! Deployment commands

use super::{CliResult, GlobalArgs};
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct DeploymentArgs {
    #[command(subcommand)]
    pub command: DeploymentCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeploymentCommand {
    Create(CreateArgs),
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub name: String,

    /// Client-facing deployment key
    #[arg(long)]
    pub key: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: i64,
}

pub async fn execute(global: &GlobalArgs, args: DeploymentArgs) -> CliResult {
    let manager = global.open_manager()?;
    match args.command {
        DeploymentCommand::Create(create) => {
            let deployment = manager.create_deployment(&create.name, &create.key).await?;
            println!("Deployment created:");
            println!("  id: {}", deployment.id);
            println!("  name: {}", deployment.name);
            println!("  key: {}", deployment.deployment_key);
        }
        DeploymentCommand::Show(show) => {
            let deployment = manager
                .get_deployment(show.id)
                .await?
                .ok_or_else(|| format!("Deployment not found: {}", show.id))?;
            let packages = manager.list_packages(deployment.id).await?;
            println!("Deployment {}:", deployment.id);
            println!("  name: {}", deployment.name);
            println!("  key: {}", deployment.deployment_key);
            println!("  labels issued: {}", deployment.label_id);
            println!("  packages: {}", packages.len());
            println!("  history entries: {}", manager.count_history(deployment.id).await?);
        }
    }
    Ok(())
}

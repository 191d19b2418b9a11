use super::report;
use crate::services::{CleanupService, CommandOptions};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ContainerCommand {
    #[command(subcommand)]
    pub action: ContainerAction,
}

#[derive(Subcommand, Debug)]
pub enum ContainerAction {
    /// Kill all running containers
    Killall,
}

pub fn run(
    cmd: ContainerCommand,
    service: &CleanupService,
    options: &CommandOptions,
) -> Result<()> {
    match cmd.action {
        ContainerAction::Killall => report::outcome(&service.kill_all(options)?),
    }
    Ok(())
}

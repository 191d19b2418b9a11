use super::report;
use crate::services::{CleanupService, CommandOptions};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ImageCommand {
    #[command(subcommand)]
    pub action: ImageAction,
}

#[derive(Subcommand, Debug)]
pub enum ImageAction {
    /// Pull every tag currently present
    Pull,
    /// Remove all dangling (untagged, unused) images
    RmDangling,
    /// Remove images which have tags matching a pattern
    RmMatching {
        /// Tag pattern (glob unless --regex)
        #[arg(long)]
        tag: String,
        /// Use a regular expression instead of a glob
        #[arg(long)]
        regex: bool,
    },
}

pub fn run(cmd: ImageCommand, service: &CleanupService, options: &CommandOptions) -> Result<()> {
    let outcome = match cmd.action {
        ImageAction::Pull => service.pull_all(options)?,
        ImageAction::RmDangling => service.rm_dangling_images(options)?,
        ImageAction::RmMatching { tag, regex } => {
            service.rm_matching_images(&tag, regex, options)?
        }
    };

    report::outcome(&outcome);
    Ok(())
}

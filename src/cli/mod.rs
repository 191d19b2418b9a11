pub mod container;
pub mod image;
pub mod report;

use crate::domain::ContainerRuntime;
use crate::infra::config::{default_config_dir, expand_config_dir, load_app_config};
use crate::infra::CliRuntimeAdapter;
use crate::services::{CleanupService, CommandOptions, StdinConfirm};
use anyhow::Result;
use clap::{Parser, Subcommand};
use container::ContainerCommand;
use image::ImageCommand;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "tidybox",
    version,
    about = "Audit and clean up container runtime images, containers and volumes"
)]
pub struct Cli {
    /// Force action, do not prompt to ask
    #[arg(long, global = true)]
    pub force: bool,

    /// Verbose logs
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Runtime CLI to drive (docker or podman)
    #[arg(long, env = "TIDYBOX_RUNTIME", global = true)]
    pub runtime: Option<String>,

    /// Configuration directory (default: ~/.config/tidybox)
    #[arg(long, env = "TIDYBOX_CONFIG_DIR", default_value_os_t = default_config_dir())]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Image operations
    Image(ImageCommand),
    /// Container operations
    Container(ContainerCommand),
    /// Remove all containers which are not running
    RmStopped,
    /// Remove all dangling volumes
    RmvDangling,
    /// Remove stopped containers whose name matches a pattern
    RmMatching {
        /// Name pattern (glob unless --regex)
        pattern: String,
        /// Use a regular expression instead of a glob
        #[arg(long)]
        regex: bool,
    },
    /// Remove stopped containers, dangling images and dangling volumes
    Scrub,
    /// Check for common issues without changing anything
    Doctor,
}

/// Holds what every command needs: the service and the resolved options.
pub struct App {
    service: CleanupService,
    options: CommandOptions,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = load_app_config(&expand_config_dir(&cli.config_dir))?;
        let binary = cli
            .runtime
            .clone()
            .unwrap_or_else(|| config.runtime_binary().to_string());

        let options = CommandOptions {
            force: cli.force || config.force_by_default(),
        };

        Ok(Self::with_runtime(
            Arc::new(CliRuntimeAdapter::new(binary)),
            options,
        ))
    }

    pub fn with_runtime(runtime: Arc<dyn ContainerRuntime>, options: CommandOptions) -> Self {
        Self {
            service: CleanupService::new(runtime, Arc::new(StdinConfirm)),
            options,
        }
    }

    pub fn service(&self) -> &CleanupService {
        &self.service
    }

    pub fn options(&self) -> &CommandOptions {
        &self.options
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let app = App::new(&cli)?;
    let service = app.service();
    let options = app.options();

    match cli.command {
        Commands::Image(cmd) => image::run(cmd, service, options),
        Commands::Container(cmd) => container::run(cmd, service, options),
        Commands::RmStopped => {
            report::outcome(&service.rm_stopped(options)?);
            Ok(())
        }
        Commands::RmvDangling => {
            report::outcome(&service.rm_dangling_volumes(options)?);
            Ok(())
        }
        Commands::RmMatching { pattern, regex } => {
            report::outcome(&service.rm_matching_containers(&pattern, regex, options)?);
            Ok(())
        }
        Commands::Scrub => {
            for outcome in service.scrub(options)? {
                report::outcome(&outcome);
            }
            Ok(())
        }
        Commands::Doctor => {
            report::doctor(&service.doctor()?);
            Ok(())
        }
    }
}

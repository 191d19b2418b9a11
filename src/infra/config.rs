use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::cli_adapter::DEFAULT_RUNTIME;

pub const CONFIG_FILE_NAME: &str = "tidybox.toml";

pub fn default_config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/root"))
        .join(".config/tidybox")
}

/// Expands `~` and environment variables in a user supplied directory.
pub fn expand_config_dir(raw: &Path) -> PathBuf {
    let raw = raw.to_string_lossy().into_owned();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// CLI used to talk to the engine (`docker` or `podman`)
    pub binary: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Skip confirmation prompts unless overridden on the command line
    pub force: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl AppConfig {
    /// Merges another AppConfig into self.
    /// Values from `other` overwrite values in `self` if present.
    pub fn merge(&mut self, other: AppConfig) {
        if let Some(binary) = other.runtime.binary {
            self.runtime.binary = Some(binary);
        }
        if let Some(force) = other.defaults.force {
            self.defaults.force = Some(force);
        }
    }

    pub fn runtime_binary(&self) -> &str {
        self.runtime.binary.as_deref().unwrap_or(DEFAULT_RUNTIME)
    }

    pub fn force_by_default(&self) -> bool {
        self.defaults.force.unwrap_or(false)
    }
}

fn read_config(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = toml::from_str(&content).with_context(|| format!("parsing {:?}", path))?;
    debug!("loaded config from {:?}", path);
    Ok(Some(config))
}

/// Loads `<config_dir>/tidybox.toml`, then overlays `./tidybox.toml` when the
/// working directory carries one. Missing files fall back to defaults.
pub fn load_app_config(config_dir: &Path) -> Result<AppConfig> {
    let mut app_config = read_config(&config_dir.join(CONFIG_FILE_NAME))?.unwrap_or_default();

    let local_config_path = PathBuf::from("./").join(CONFIG_FILE_NAME);
    if let Some(local) = read_config(&local_config_path)? {
        app_config.merge(local);
    }

    Ok(app_config)
}

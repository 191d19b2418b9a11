use crate::domain::{Container, ContainerRuntime, ContainerState, Image, Volume};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::process::{Command, Output, Stdio};
use tracing::{debug, warn};

pub const DEFAULT_RUNTIME: &str = "docker";

/// Runtime gateway backed by the `docker` or `podman` command line.
///
/// Both CLIs accept the same `ls -q` / `inspect` / `rm` subcommands and emit
/// compatible inspect JSON, so only the binary differs.
#[derive(Debug, Clone)]
pub struct CliRuntimeAdapter {
    binary: String,
}

impl CliRuntimeAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    pub fn podman() -> Self {
        Self::new("podman")
    }

    fn ids(&self, args: &[&str], context: &str) -> Result<Vec<String>> {
        let output = self.run_captured(args, context)?;
        let mut seen = HashSet::new();
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect())
    }

    /// Inspects `ids` in one call. If an entry vanished since listing, the
    /// batch fails and each id is retried alone so the missing one is skipped.
    /// Unparseable batch output is an error.
    fn inspect<T: DeserializeOwned>(&self, kind: &str, ids: &[String]) -> Result<Inspected<T>> {
        let mut inspected = Inspected::default();
        if ids.is_empty() {
            return Ok(inspected);
        }

        let context = format!("inspecting {kind}s");
        let mut args = vec![kind, "inspect"];
        args.extend(ids.iter().map(String::as_str));

        match self.run_captured(&args, &context) {
            Ok(output) => inspected.entries = parse_entries(kind, &output.stdout)?,
            Err(e) if ids.len() == 1 => inspected.absorb(kind, &ids[0], Err(e)),
            Err(e) => {
                debug!("batch inspect of {kind}s failed ({e:#}), retrying one by one");
                for id in ids {
                    let result = self.run_captured([kind, "inspect", id.as_str()], &context);
                    inspected.absorb(kind, id, result);
                }
            }
        }

        Ok(inspected)
    }

    fn run_captured<I, S>(&self, args: I, context: &str) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("{context} ({} not found?)", self.binary))?;

        if !output.status.success() {
            bail!(
                "{} returned {} ({context}): {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(output)
    }

    fn run<I, S>(&self, args: I, context: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run_captured(args, context).map(|_| ())
    }
}

impl Default for CliRuntimeAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME)
    }
}

impl ContainerRuntime for CliRuntimeAdapter {
    fn name(&self) -> &str {
        &self.binary
    }

    fn list_images(&self) -> Result<Vec<Image>> {
        let ids = self.ids(&["image", "ls", "-q", "--no-trunc"], "listing images")?;
        let inspected: Inspected<RawImage> = self.inspect("image", &ids)?;
        Ok(inspected
            .entries
            .into_iter()
            .filter_map(RawImage::into_domain)
            .collect())
    }

    fn list_containers(&self) -> Result<Vec<Container>> {
        let ids = self.ids(
            &["container", "ls", "-a", "-q", "--no-trunc"],
            "listing containers",
        )?;
        let inspected: Inspected<RawContainer> = self.inspect("container", &ids)?;
        let mut containers: Vec<Container> = inspected
            .entries
            .into_iter()
            .filter_map(RawContainer::into_domain)
            .collect();

        // A listed container we could not read may still use images and
        // volumes, so it stays in the inventory with nothing known about it.
        for id in &ids {
            let readable = containers.iter().any(|c| same_id(&c.id, id));
            if !readable && !inspected.vanished.contains(id) {
                warn!("container {id} has unreadable metadata, treating it as in use");
                containers.push(Container::unreadable(id.as_str()));
            }
        }

        Ok(containers)
    }

    fn list_volumes(&self) -> Result<Vec<Volume>> {
        let names = self.ids(&["volume", "ls", "-q"], "listing volumes")?;
        let inspected: Inspected<RawVolume> = self.inspect("volume", &names)?;
        Ok(inspected
            .entries
            .into_iter()
            .filter_map(RawVolume::into_domain)
            .collect())
    }

    fn remove_image(&self, reference: &str) -> Result<()> {
        self.run(["image", "rm", reference], &format!("removing image {reference}"))
    }

    fn remove_container(&self, id: &str) -> Result<()> {
        self.run(["container", "rm", id], &format!("removing container {id}"))
    }

    fn kill_container(&self, id: &str) -> Result<()> {
        self.run(["container", "kill", id], &format!("killing container {id}"))
    }

    fn remove_volume(&self, name: &str) -> Result<()> {
        self.run(["volume", "rm", name], &format!("removing volume {name}"))
    }

    fn pull_image(&self, tag: &str) -> Result<()> {
        // Inherit stdio so the runtime renders its own progress.
        let status = Command::new(&self.binary)
            .args(["image", "pull", tag])
            .status()
            .with_context(|| format!("pulling {tag}"))?;

        if !status.success() {
            bail!("{} returned {status} (pulling {tag})", self.binary);
        }

        Ok(())
    }
}

/// Entries read back from `inspect`, plus the ids the runtime no longer knows.
#[derive(Debug)]
struct Inspected<T> {
    entries: Vec<T>,
    vanished: HashSet<String>,
}

impl<T> Default for Inspected<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            vanished: HashSet::new(),
        }
    }
}

impl<T: DeserializeOwned> Inspected<T> {
    fn absorb(&mut self, kind: &str, id: &str, result: Result<Output>) {
        match result.and_then(|output| parse_entries(kind, &output.stdout)) {
            Ok(entries) => self.entries.extend(entries),
            Err(e) if is_not_found(&e) => {
                debug!("{kind} {id} vanished since listing");
                self.vanished.insert(id.to_string());
            }
            Err(e) => warn!("unreadable {kind} {id}: {e:#}"),
        }
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    let message = format!("{err:#}").to_lowercase();
    [
        "no such container",
        "no such image",
        "no such volume",
        "no such object",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

/// Listing may print short or full ids.
fn same_id(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.starts_with(b) || b.starts_with(a))
}

fn parse_entries<T: DeserializeOwned>(kind: &str, stdout: &[u8]) -> Result<Vec<T>> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(stdout)
        .with_context(|| format!("unreadable {kind} inspect output"))?;

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping malformed {kind} entry: {e}");
                None
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawImage {
    id: Option<String>,
    repo_tags: Option<Vec<String>>,
    created: Option<String>,
}

impl RawImage {
    fn into_domain(self) -> Option<Image> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let tags = self
            .repo_tags
            .unwrap_or_default()
            .into_iter()
            .filter(|tag| !tag.contains("<none>"))
            .collect();

        Some(Image {
            id,
            tags,
            created: self.created,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainer {
    id: Option<String>,
    name: Option<String>,
    image: Option<String>,
    /// Podman reports the creation reference here as well as in `Config`.
    image_name: Option<String>,
    config: Option<RawContainerConfig>,
    state: Option<RawState>,
    created: Option<String>,
    mounts: Option<Vec<RawMount>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawContainerConfig {
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawState {
    running: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMount {
    #[serde(rename = "Type")]
    kind: Option<String>,
    name: Option<String>,
}

impl RawContainer {
    fn into_domain(self) -> Option<Container> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let name = self
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_else(|| id.clone());

        let state = match self.state.and_then(|s| s.running) {
            Some(true) => ContainerState::Running,
            Some(false) => ContainerState::Stopped,
            None => ContainerState::Unknown,
        };

        let image_ref = self.config.and_then(|c| c.image).or(self.image_name);

        let volumes = self.mounts.map(|mounts| {
            mounts
                .into_iter()
                .filter(|m| m.kind.as_deref() == Some("volume"))
                .filter_map(|m| m.name)
                .collect()
        });

        Some(Container {
            id,
            name,
            state,
            image_id: self.image,
            image_ref,
            created: self.created,
            volumes,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawVolume {
    name: Option<String>,
    labels: Option<BTreeMap<String, String>>,
}

impl RawVolume {
    fn into_domain(self) -> Option<Volume> {
        let name = self.name.filter(|n| !n.is_empty())?;
        Some(Volume {
            name,
            labels: self.labels.unwrap_or_default(),
        })
    }
}

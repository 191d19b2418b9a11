use super::{Container, Image, Volume};
use anyhow::Result;
use std::fmt::Debug;

/// Capabilities the cleanup core needs from a container runtime.
///
/// Listing operations return the full current state; nothing is cached
/// between calls.
pub trait ContainerRuntime: Send + Sync + Debug {
    /// Name of the runtime, used in diagnostics
    fn name(&self) -> &str;

    /// List top-level local images
    fn list_images(&self) -> Result<Vec<Image>>;

    /// List containers in every state
    fn list_containers(&self) -> Result<Vec<Container>>;

    /// List volumes
    fn list_volumes(&self) -> Result<Vec<Volume>>;

    /// Remove an image by id or tag
    fn remove_image(&self, reference: &str) -> Result<()>;

    /// Remove a container
    fn remove_container(&self, id: &str) -> Result<()>;

    /// Kill a running container
    fn kill_container(&self, id: &str) -> Result<()>;

    /// Remove a volume
    fn remove_volume(&self, name: &str) -> Result<()>;

    /// Pull a tag, streaming progress to the terminal
    fn pull_image(&self, tag: &str) -> Result<()>;
}

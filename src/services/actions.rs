use super::planner::ItemAction;
use crate::domain::{Container, ContainerRuntime, Image, Volume};
use anyhow::Result;

pub struct RemoveImage<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&Image> for RemoveImage<'_> {
    fn describe(&self) -> &str {
        "removing dangling image"
    }

    fn apply(&self, image: &&Image) -> Result<()> {
        self.runtime.remove_image(&image.id)
    }
}

/// Removes an image through one of its tags. The runtime only drops the tag
/// while other tags still point at the image.
pub struct RemoveImageByTag<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&str> for RemoveImageByTag<'_> {
    fn describe(&self) -> &str {
        "removing image via tag"
    }

    fn apply(&self, tag: &&str) -> Result<()> {
        self.runtime.remove_image(tag)
    }
}

pub struct RemoveContainer<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&Container> for RemoveContainer<'_> {
    fn describe(&self) -> &str {
        "removing container"
    }

    fn apply(&self, container: &&Container) -> Result<()> {
        self.runtime.remove_container(&container.id)
    }
}

pub struct KillContainer<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&Container> for KillContainer<'_> {
    fn describe(&self) -> &str {
        "killing container"
    }

    fn apply(&self, container: &&Container) -> Result<()> {
        self.runtime.kill_container(&container.id)
    }
}

pub struct RemoveVolume<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&Volume> for RemoveVolume<'_> {
    fn describe(&self) -> &str {
        "removing dangling volume"
    }

    fn apply(&self, volume: &&Volume) -> Result<()> {
        self.runtime.remove_volume(&volume.name)
    }
}

pub struct PullImage<'a> {
    pub runtime: &'a dyn ContainerRuntime,
}

impl ItemAction<&str> for PullImage<'_> {
    fn describe(&self) -> &str {
        "pulling tag"
    }

    fn apply(&self, tag: &&str) -> Result<()> {
        self.runtime.pull_image(tag)
    }
}

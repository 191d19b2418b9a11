use crate::domain::image::{normalize_reference, strip_digest};
use crate::domain::{CleanupError, Container, ContainerRuntime, Image, Volume};
use tracing::debug;

const MIN_ID_PREFIX: usize = 12;

/// Which entity kinds a snapshot should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub images: bool,
    pub containers: bool,
    pub volumes: bool,
}

impl Scope {
    pub const ALL: Scope = Scope {
        images: true,
        containers: true,
        volumes: true,
    };
    pub const IMAGES: Scope = Scope {
        images: true,
        containers: false,
        volumes: false,
    };
    pub const CONTAINERS: Scope = Scope {
        images: false,
        containers: true,
        volumes: false,
    };
    pub const IMAGES_AND_CONTAINERS: Scope = Scope {
        images: true,
        containers: true,
        volumes: false,
    };
    pub const VOLUMES_AND_CONTAINERS: Scope = Scope {
        images: false,
        containers: true,
        volumes: true,
    };
}

/// Point-in-time view of the runtime, owned by a single command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub images: Vec<Image>,
    pub containers: Vec<Container>,
    pub volumes: Vec<Volume>,
}

impl Inventory {
    pub fn snapshot(runtime: &dyn ContainerRuntime) -> Result<Self, CleanupError> {
        Self::collect(runtime, Scope::ALL)
    }

    pub fn collect(runtime: &dyn ContainerRuntime, scope: Scope) -> Result<Self, CleanupError> {
        let unavailable = |e: anyhow::Error| CleanupError::runtime_unavailable(runtime.name(), &e);

        let images = if scope.images {
            runtime.list_images().map_err(unavailable)?
        } else {
            Vec::new()
        };
        let containers = if scope.containers {
            runtime.list_containers().map_err(unavailable)?
        } else {
            Vec::new()
        };
        let volumes = if scope.volumes {
            runtime.list_volumes().map_err(unavailable)?
        } else {
            Vec::new()
        };

        debug!(
            "snapshot: {} images, {} containers, {} volumes",
            images.len(),
            containers.len(),
            volumes.len()
        );

        Ok(Self {
            images,
            containers,
            volumes,
        })
    }

    /// Resolves an id, tag or id prefix against this snapshot.
    pub fn resolve_image(&self, reference: &str) -> Option<&Image> {
        if let Some(image) = self.images.iter().find(|i| i.has_id(reference)) {
            return Some(image);
        }
        if let Some(image) = self.images.iter().find(|i| i.has_tag(reference)) {
            return Some(image);
        }

        let normalized = normalize_reference(reference);
        if let Some(image) = self.images.iter().find(|i| i.has_tag(&normalized)) {
            return Some(image);
        }

        let prefix = strip_digest(reference);
        if prefix.len() >= MIN_ID_PREFIX && prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return self
                .images
                .iter()
                .find(|i| strip_digest(&i.id).starts_with(prefix));
        }

        None
    }

    /// Every tag of every image, in inventory order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .flat_map(|image| image.tags.iter().map(String::as_str))
    }
}

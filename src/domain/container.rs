use super::image::truncate_id;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    /// The runtime did not report a readable state.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub state: ContainerState,
    /// Id of the image the container is actually running.
    pub image_id: Option<String>,
    /// Reference (tag or id) the container was created from.
    pub image_ref: Option<String>,
    pub created: Option<String>,
    /// Named volumes mounted by the container, `None` when unreadable.
    pub volumes: Option<Vec<String>>,
}

impl Container {
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: ContainerState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state,
            image_id: None,
            image_ref: None,
            created: None,
            volumes: Some(Vec::new()),
        }
    }

    /// A listed container whose metadata could not be read. Nothing about it
    /// is trusted, so it keeps every image and volume in play.
    pub fn unreadable(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            state: ContainerState::Unknown,
            image_id: None,
            image_ref: None,
            created: None,
            volumes: None,
        }
    }

    pub fn with_image(mut self, image_id: &str, image_ref: &str) -> Self {
        self.image_id = Some(image_id.to_string());
        self.image_ref = Some(image_ref.to_string());
        self
    }

    pub fn with_volumes(mut self, volumes: &[&str]) -> Self {
        self.volumes = Some(volumes.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ContainerState::Stopped
    }

    pub fn mounts(&self, volume: &str) -> bool {
        self.volumes
            .as_ref()
            .is_some_and(|names| names.iter().any(|name| name == volume))
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}, {}]",
            self.name,
            self.image_ref.as_deref().unwrap_or("?"),
            truncate_id(&self.id)
        )
    }
}

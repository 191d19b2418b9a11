use super::{Container, Image, Volume};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingKind {
    DanglingImage,
    DanglingVolume,
    StoppedContainer,
    StaleTagContainer,
}

/// One classified entity, borrowed from the inventory it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding<'a> {
    DanglingImage(&'a Image),
    DanglingVolume(&'a Volume),
    StoppedContainer(&'a Container),
    StaleTagContainer {
        container: &'a Container,
        tag: &'a str,
        running_image_id: &'a str,
        current_image_id: &'a str,
    },
}

impl Finding<'_> {
    pub fn kind(&self) -> FindingKind {
        match self {
            Self::DanglingImage(_) => FindingKind::DanglingImage,
            Self::DanglingVolume(_) => FindingKind::DanglingVolume,
            Self::StoppedContainer(_) => FindingKind::StoppedContainer,
            Self::StaleTagContainer { .. } => FindingKind::StaleTagContainer,
        }
    }
}

impl fmt::Display for Finding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingImage(image) => write!(f, "image {image}: dangling"),
            Self::DanglingVolume(volume) => write!(f, "volume {volume}: dangling"),
            Self::StoppedContainer(container) => write!(f, "container {container}: stopped"),
            Self::StaleTagContainer { container, tag, .. } => write!(
                f,
                "running container {container}: launched from outdated version of {tag}"
            ),
        }
    }
}

mod container;
pub mod error;
mod finding;
pub mod image;
pub mod traits;
mod volume;

pub use container::{Container, ContainerState};
pub use error::CleanupError;
pub use finding::{Finding, FindingKind};
pub use image::Image;
pub use traits::ContainerRuntime;
pub use volume::Volume;

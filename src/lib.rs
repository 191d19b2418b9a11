pub mod cli;
pub mod domain;
pub mod infra;
pub mod services;

// Shared by unit and integration tests
pub mod test_support;

pub use domain::{
    CleanupError, Container, ContainerRuntime, ContainerState, Finding, FindingKind, Image, Volume,
};
pub use infra::CliRuntimeAdapter;
pub use services::{CleanupService, CommandOptions, DoctorReport, Outcome};

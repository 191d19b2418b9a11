use thiserror::Error;

/// Errors surfaced by the audit and cleanup core.
///
/// `RuntimeUnavailable` and `InvalidPattern` abort a command before any plan
/// is formed. `ItemActionFailed` is only ever collected per item during
/// execution and never escapes a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanupError {
    /// The container runtime could not be queried.
    #[error("container runtime '{runtime}' is unavailable: {reason}")]
    RuntimeUnavailable { runtime: String, reason: String },

    /// A glob or regular expression given by the user failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A single action of a batch failed.
    #[error("{item}: {reason}")]
    ItemActionFailed { item: String, reason: String },
}

impl CleanupError {
    pub fn runtime_unavailable(runtime: &str, err: &anyhow::Error) -> Self {
        Self::RuntimeUnavailable {
            runtime: runtime.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ItemActionFailed { .. })
    }
}

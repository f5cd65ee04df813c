//! DOM errors

use arbor_task::TaskError;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
///
/// Stale node references are not errors: they are skipped where they occur.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// The render collaborator was dropped before the flush
    #[error("Render manager is no longer available")]
    RenderManagerUnavailable,

    #[error("Task runner error: {0}")]
    Task(#[from] TaskError),
}

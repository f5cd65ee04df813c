//! Task runner errors

/// Errors reported by [`TaskRunner`](crate::TaskRunner)
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The runner no longer accepts work
    #[error("Task runner '{name}' has been terminated")]
    Terminated { name: String },

    /// The runner thread was never started
    #[error("Task runner '{name}' has not been started")]
    NotStarted { name: String },

    /// A posted task was dropped before it could report back
    #[error("Task runner '{name}' dropped the task before completion")]
    Disconnected { name: String },

    /// The OS refused to spawn the runner thread
    #[error("Failed to spawn task runner thread: {0}")]
    Spawn(#[from] std::io::Error),
}

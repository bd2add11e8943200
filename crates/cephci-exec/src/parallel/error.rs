use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallelError {
    #[error("task `{task}` failed: {cause:#}")]
    Task { task: String, cause: anyhow::Error },
    #[error("task `{task}` panicked: {message}")]
    Panicked { task: String, message: String },
    #[error("parallel scope is closed")]
    ScopeClosed,
    #[error("parallel scope aborted after a task failure")]
    Aborted,
    #[error("failed to start worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl ParallelError {
    /// Name of the failing task, for task failures.
    pub fn task(&self) -> Option<&str> {
        match self {
            ParallelError::Task { task, .. } | ParallelError::Panicked { task, .. } => Some(task),
            _ => None,
        }
    }
}

//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur while setting up an execution context.
///
/// Dispatch itself never fails; these only come from constructing schedulers.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// No tokio runtime is running on the current thread.
    #[error("no tokio runtime available on the current thread")]
    NoRuntime,
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

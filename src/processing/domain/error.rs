//! Error types for processing domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned by processing task aggregate operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// Transitioning between two task statuses is not permitted.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested target status.
        to: TaskStatus,
    },

    /// Progress cannot be recorded once a task has reached a terminal status.
    #[error("cannot record progress for task {task_id} in terminal status {status}")]
    ProgressOnTerminalTask {
        /// Task identifier.
        task_id: TaskId,
        /// Terminal status of the task.
        status: TaskStatus,
    },

    /// Digest generation may only be requested for running tasks.
    #[error("digest request for task {task_id} requires running status (current: {status})")]
    DigestRequiresRunning {
        /// Task identifier.
        task_id: TaskId,
        /// Current status of the task.
        status: TaskStatus,
    },

    /// Digest generation has already been requested for the task.
    #[error("digest generation already requested for task {0}")]
    DigestAlreadyRequested(TaskId),
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task kind: {0}")]
pub struct ParseTaskKindError(pub String);

/// Error returned while parsing requested digest time ranges.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown time range '{0}', expected day, week, or month")]
pub struct ParseTimeRangeError(pub String);

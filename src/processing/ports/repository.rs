//! Repository port for processing task persistence.

use crate::processing::domain::{
    OwnerId, ProcessingTask, ProgressUpdate, TaskDomainError, TaskId, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// One entry of the pollable set: the task, or the reason its stored record
/// could not be read.
pub type PollableTask = Result<ProcessingTask, UnreadableTask>;

/// Task store contract.
///
/// Implementations enforce the single-active-task-per-owner rule on insert
/// and make every status write conditional on the stored status, so
/// overlapping admissions and polls cannot both win.
#[async_trait]
pub trait ProcessingTaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists or [`TaskRepositoryError::ActiveTaskExists`] when the owner
    /// already has a pending or running task.
    async fn store(&self, task: &ProcessingTask) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProcessingTask>>;

    /// Finds the owner's pending or running task, if any.
    async fn find_active_for_owner(
        &self,
        owner: OwnerId,
    ) -> TaskRepositoryResult<Option<ProcessingTask>>;

    /// Returns pending and running tasks whose digest trigger has not been
    /// claimed, oldest first.
    ///
    /// Records that fail to decode are returned in place as
    /// [`UnreadableTask`] so the rest of the set stays usable.
    async fn find_awaiting_digest(&self) -> TaskRepositoryResult<Vec<PollableTask>>;

    /// Persists `task` only if the stored status still equals `expected`.
    ///
    /// Writes status, result, digest claim and timestamps. Progress counters
    /// are left untouched; they change only through
    /// [`ProcessingTaskRepository::record_progress`]. Returns `false` when
    /// another writer changed the status first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update_if_status(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<bool>;

    /// Claims the digest trigger for a running, unclaimed task.
    ///
    /// Returns `false` when the task is no longer running or was already
    /// claimed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn claim_digest_trigger(
        &self,
        id: TaskId,
        claimed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool>;

    /// Atomically applies a progress update and returns the updated task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// or [`TaskRepositoryError::Domain`] when the task is terminal.
    async fn record_progress(
        &self,
        id: TaskId,
        update: ProgressUpdate,
        recorded_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProcessingTask>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The owner already has an active task.
    #[error("owner {owner} already has active task {task_id} ({status})")]
    ActiveTaskExists {
        /// Owner of both tasks.
        owner: OwnerId,
        /// Identifier of the existing active task.
        task_id: TaskId,
        /// Status of the existing active task.
        status: TaskStatus,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored aggregate rejected the change.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

/// A stored task record that could not be decoded.
#[derive(Debug, Clone, Error)]
#[error("task {task_id} could not be read: {error}")]
pub struct UnreadableTask {
    /// Identifier of the unreadable record.
    pub task_id: TaskId,
    /// Decoding failure.
    #[source]
    pub error: TaskRepositoryError,
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

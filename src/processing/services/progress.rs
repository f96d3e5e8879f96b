//! Signals reported back by sub-jobs and the digest subsystem.

use crate::processing::{
    domain::{
        ProcessingTask, ProgressUpdate, SourceId, TaskDomainError, TaskId, TaskResult, TaskStatus,
    },
    ports::{ProcessingTaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Outcome reported when the digest subsystem has delivered a digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestDelivery {
    /// Identifier of the generated digest, if reported.
    pub digest_id: Option<String>,
    /// Whether the digest was built from partial results.
    pub partial: bool,
}

/// Errors returned by task progress operations.
#[derive(Debug, Error)]
pub enum TaskProgressError {
    /// No task exists with the given identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The task changed status concurrently.
    #[error("task {task_id} changed status concurrently (expected {expected})")]
    Concurrent {
        /// Task identifier.
        task_id: TaskId,
        /// Status the write was conditioned on.
        expected: TaskStatus,
    },
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task progress operations.
pub type TaskProgressResult<T> = Result<T, TaskProgressError>;

/// Applies progress and completion signals to tasks.
#[derive(Clone)]
pub struct TaskProgressService<R, C>
where
    R: ProcessingTaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TaskProgressService<R, C>
where
    R: ProcessingTaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a progress service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns a task for progress display.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProgressError::NotFound`] when the task does not exist.
    pub async fn get(&self, task_id: TaskId) -> TaskProgressResult<ProcessingTask> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskProgressError::NotFound(task_id))
    }

    /// Records that a sub-job was registered, moving a pending task to
    /// running. Idempotent for tasks that are already running.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProgressError::Domain`] when the task is terminal, or
    /// [`TaskProgressError::Concurrent`] when another writer changed the status
    /// in between.
    pub async fn register_sub_job(&self, task_id: TaskId) -> TaskProgressResult<ProcessingTask> {
        let mut task = self.get(task_id).await?;
        if task.status() == TaskStatus::Running {
            return Ok(task);
        }

        let expected = task.status();
        task.mark_running(&*self.clock)?;
        self.write_conditionally(&task, expected).await?;
        info!(%task_id, "task running after first sub-job registration");
        Ok(task)
    }

    /// Records a processed source.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProgressError::Repository`] when the task is missing or
    /// terminal.
    pub async fn record_source_processed(
        &self,
        task_id: TaskId,
        source_id: SourceId,
    ) -> TaskProgressResult<ProcessingTask> {
        self.record(task_id, ProgressUpdate::SourceProcessed(source_id))
            .await
    }

    /// Records a skipped source with the reason it was skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProgressError::Repository`] when the task is missing or
    /// terminal.
    pub async fn record_source_skipped(
        &self,
        task_id: TaskId,
        source_id: SourceId,
        reason: impl Into<String>,
    ) -> TaskProgressResult<ProcessingTask> {
        self.record(
            task_id,
            ProgressUpdate::SourceSkipped {
                source_id,
                reason: reason.into(),
            },
        )
        .await
    }

    /// Completes a task once the digest subsystem reports delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TaskProgressError::Domain`] when the task is already
    /// terminal, or [`TaskProgressError::Concurrent`] when another writer
    /// changed the status in between.
    pub async fn mark_digest_delivered(
        &self,
        task_id: TaskId,
        delivery: DigestDelivery,
    ) -> TaskProgressResult<ProcessingTask> {
        let mut task = self.get(task_id).await?;
        let expected = task.status();
        task.complete(
            TaskResult::DigestGenerated {
                digest_id: delivery.digest_id,
                partial: delivery.partial,
            },
            &*self.clock,
        )?;
        self.write_conditionally(&task, expected).await?;
        info!(%task_id, partial = delivery.partial, "task complete");
        Ok(task)
    }

    async fn record(
        &self,
        task_id: TaskId,
        update: ProgressUpdate,
    ) -> TaskProgressResult<ProcessingTask> {
        let task = self
            .repository
            .record_progress(task_id, update, self.clock.utc())
            .await?;
        debug!(
            %task_id,
            current = task.progress().current(),
            total = task.progress().total(),
            "recorded progress"
        );
        Ok(task)
    }

    async fn write_conditionally(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> TaskProgressResult<()> {
        if self.repository.update_if_status(task, expected).await? {
            Ok(())
        } else {
            Err(TaskProgressError::Concurrent {
                task_id: task.id(),
                expected,
            })
        }
    }
}

//! Task admission: single active task per owner with inline stale
//! reclamation.

use crate::processing::{
    domain::{
        OwnerId, ProcessingTask, TaskConfig, TaskDomainError, TaskFailure, TaskId, TaskKind,
        TaskStatus, TimeRange,
    },
    ports::{ActiveSourceCounter, ProcessingTaskRepository, SourceCountError, TaskRepositoryError},
};
use chrono::TimeDelta;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Age after which an active task is considered abandoned.
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(60 * 60);

/// Request payload for starting a processing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTaskRequest {
    owner: OwnerId,
    config: TaskConfig,
}

impl StartTaskRequest {
    /// Creates a request with default task parameters.
    #[must_use]
    pub fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            config: TaskConfig::default(),
        }
    }

    /// Sets the time range the resulting digest should cover.
    #[must_use]
    pub const fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.config.time_range = time_range;
        self
    }

    /// Returns the requesting owner.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }
}

/// Errors returned by task admission.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The owner already has an active task.
    #[error("processing task {task_id} is already {status}; wait for it to finish")]
    Conflict {
        /// Identifier of the existing task.
        task_id: TaskId,
        /// Status of the existing task.
        status: TaskStatus,
    },
    /// Counting the owner's active sources failed.
    #[error(transparent)]
    SourceCount(#[from] SourceCountError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
}

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// Admits new processing tasks.
#[derive(Clone)]
pub struct TaskAdmissionService<R, S, C>
where
    R: ProcessingTaskRepository,
    S: ActiveSourceCounter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    sources: Arc<S>,
    clock: Arc<C>,
    staleness_threshold: TimeDelta,
}

impl<R, S, C> TaskAdmissionService<R, S, C>
where
    R: ProcessingTaskRepository,
    S: ActiveSourceCounter,
    C: Clock + Send + Sync,
{
    /// Creates an admission service with the default one-hour staleness
    /// threshold.
    #[must_use]
    pub fn new(repository: Arc<R>, sources: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            repository,
            sources,
            clock,
            staleness_threshold: to_time_delta(DEFAULT_STALENESS_THRESHOLD),
        }
    }

    /// Overrides the staleness threshold.
    #[must_use]
    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = to_time_delta(threshold);
        self
    }

    /// Admits a new task for the owner.
    ///
    /// An existing active task older than the staleness threshold is failed
    /// first. The caller is responsible for scheduling the sub-jobs.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionError::Conflict`] when an active task remains after
    /// reclamation, including when a concurrent admission won the race.
    /// Collaborator and repository failures propagate unchanged.
    pub async fn start(&self, request: StartTaskRequest) -> AdmissionResult<ProcessingTask> {
        let owner = request.owner;
        if let Some(existing) = self.repository.find_active_for_owner(owner).await? {
            debug!(
                %owner,
                task_id = %existing.id(),
                status = %existing.status(),
                "found active task"
            );
            self.reclaim_if_stale(existing).await?;

            if let Some(remaining) = self.repository.find_active_for_owner(owner).await? {
                warn!(
                    %owner,
                    task_id = %remaining.id(),
                    status = %remaining.status(),
                    "rejecting admission, task already active"
                );
                return Err(AdmissionError::Conflict {
                    task_id: remaining.id(),
                    status: remaining.status(),
                });
            }
        }

        let total_sources = self.sources.count_active_sources(owner).await?;
        let task = ProcessingTask::new(
            owner,
            TaskKind::ProcessAllSources,
            request.config,
            total_sources,
            &*self.clock,
        );

        match self.repository.store(&task).await {
            Ok(()) => {
                info!(%owner, task_id = %task.id(), total_sources, "admitted processing task");
                Ok(task)
            }
            Err(TaskRepositoryError::ActiveTaskExists {
                task_id, status, ..
            }) => {
                warn!(%owner, %task_id, %status, "concurrent admission won the race");
                Err(AdmissionError::Conflict { task_id, status })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Fails `task` when it has outlived the staleness threshold.
    async fn reclaim_if_stale(&self, mut task: ProcessingTask) -> AdmissionResult<()> {
        let now = self.clock.utc();
        if !task.is_stale(now, self.staleness_threshold) {
            return Ok(());
        }

        let expected = task.status();
        let age = task.age(now);
        task.fail(TaskFailure::stale(age.num_seconds()), &*self.clock)?;
        if self.repository.update_if_status(&task, expected).await? {
            info!(
                owner = %task.owner(),
                task_id = %task.id(),
                age_minutes = age.num_minutes(),
                "reclaimed stale task"
            );
        } else {
            debug!(task_id = %task.id(), "stale task changed status before reclamation");
        }
        Ok(())
    }
}

fn to_time_delta(threshold: Duration) -> TimeDelta {
    TimeDelta::from_std(threshold).unwrap_or(TimeDelta::MAX)
}

//! Processing task aggregate root.

use super::{
    OwnerId, ProgressUpdate, TaskConfig, TaskDomainError, TaskFailure, TaskId, TaskKind,
    TaskProgress, TaskResult, TaskStatus,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One orchestration record tracking a fetch → process → digest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTask {
    id: TaskId,
    owner: OwnerId,
    kind: TaskKind,
    status: TaskStatus,
    config: TaskConfig,
    progress: TaskProgress,
    result: Option<TaskResult>,
    digest_requested_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owner.
    pub owner: OwnerId,
    /// Persisted task kind.
    pub kind: TaskKind,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted creation parameters.
    pub config: TaskConfig,
    /// Persisted progress counters.
    pub progress: TaskProgress,
    /// Persisted terminal payload, if any.
    pub result: Option<TaskResult>,
    /// Persisted digest trigger claim timestamp, if any.
    pub digest_requested_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted terminal transition timestamp, if any.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProcessingTask {
    /// Creates a pending task sized for `total_sources` sources.
    #[must_use]
    pub fn new(
        owner: OwnerId,
        kind: TaskKind,
        config: TaskConfig,
        total_sources: u32,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            owner,
            kind,
            status: TaskStatus::Pending,
            config,
            progress: TaskProgress::new(total_sources),
            result: None,
            digest_requested_at: None,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            owner: data.owner,
            kind: data.kind,
            status: data.status,
            config: data.config,
            progress: data.progress,
            result: data.result,
            digest_requested_at: data.digest_requested_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning identity.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the task status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation parameters.
    #[must_use]
    pub const fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Returns the progress counters.
    #[must_use]
    pub const fn progress(&self) -> &TaskProgress {
        &self.progress
    }

    /// Returns the terminal payload, if any.
    #[must_use]
    pub const fn result(&self) -> Option<&TaskResult> {
        self.result.as_ref()
    }

    /// Returns when the digest trigger was claimed, if it was.
    #[must_use]
    pub const fn digest_requested_at(&self) -> Option<DateTime<Utc>> {
        self.digest_requested_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the terminal transition timestamp, if any.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns how long the task has existed at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Returns whether the task is still active and older than `threshold`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.status.is_active() && self.age(now) > threshold
    }

    /// Returns whether the poller should inspect this task: it is pending or
    /// running and its digest trigger is unclaimed.
    #[must_use]
    pub const fn awaits_digest(&self) -> bool {
        self.status.is_active() && self.digest_requested_at.is_none()
    }

    /// Returns whether the digest trigger can be claimed now.
    #[must_use]
    pub const fn can_claim_digest(&self) -> bool {
        matches!(self.status, TaskStatus::Running) && self.digest_requested_at.is_none()
    }

    /// Moves a pending task to running once its first sub-job registers.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// pending.
    pub fn mark_running(&mut self, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Running, clock)
    }

    /// Stamps the digest trigger claim.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DigestRequiresRunning`] when the task is not
    /// running, or [`TaskDomainError::DigestAlreadyRequested`] when the
    /// trigger was already claimed.
    pub fn mark_digest_requested(
        &mut self,
        requested_at: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Running {
            return Err(TaskDomainError::DigestRequiresRunning {
                task_id: self.id,
                status: self.status,
            });
        }
        if self.digest_requested_at.is_some() {
            return Err(TaskDomainError::DigestAlreadyRequested(self.id));
        }
        self.digest_requested_at = Some(requested_at);
        self.updated_at = requested_at;
        Ok(())
    }

    /// Records a progress update from a sub-job. Returns whether anything
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ProgressOnTerminalTask`] when the task has
    /// already finished.
    pub fn record_progress(
        &mut self,
        update: ProgressUpdate,
        recorded_at: DateTime<Utc>,
    ) -> Result<bool, TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::ProgressOnTerminalTask {
                task_id: self.id,
                status: self.status,
            });
        }
        let changed = self.progress.apply(update);
        if changed {
            self.updated_at = recorded_at;
        }
        Ok(changed)
    }

    /// Completes the task with the digest outcome.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already terminal.
    pub fn complete(
        &mut self,
        result: TaskResult,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Complete, clock)?;
        self.result = Some(result);
        Ok(())
    }

    /// Fails the task with structured detail.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already terminal.
    pub fn fail(
        &mut self,
        failure: TaskFailure,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.transition_to(TaskStatus::Failed, clock)?;
        self.result = Some(TaskResult::Failed(failure));
        Ok(())
    }

    fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        if target.is_terminal() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

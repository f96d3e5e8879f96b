//! Completion poller: one-shot scan of active tasks, invoked by an external
//! scheduler.
//!
//! Each task is handled in isolation. A pending task is moved to running once
//! the aggregation view shows sub-jobs for it; a pending task without any
//! sub-jobs is left alone. A task is handed to the trigger adapter only after
//! this poller wins the digest trigger claim, so overlapping invocations never
//! request the same digest twice.

use super::{CompletionOracle, DigestTriggerAdapter};
use crate::processing::{
    domain::{CompletionStatus, ProcessingTask, TaskId, TaskStatus},
    ports::{
        CompletionCountsSource, DigestGenerator, ProcessingTaskRepository, UnreadableTask,
        UserPreferences,
    },
};
use mockable::Clock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Stage of a poll cycle at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollFailureKind {
    /// Loading the pollable task set, or one record in it, failed.
    Load,
    /// The completion oracle failed for a task.
    Oracle,
    /// Moving a pending task with sub-jobs to running failed.
    Promote,
    /// Claiming the digest trigger failed.
    Claim,
    /// The trigger adapter failed.
    Trigger,
}

impl PollFailureKind {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Oracle => "oracle",
            Self::Promote => "promote",
            Self::Claim => "claim",
            Self::Trigger => "trigger",
        }
    }
}

impl fmt::Display for PollFailureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One failure recorded during a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollFailure {
    /// Affected task; absent when the task set could not be loaded.
    pub task_id: Option<TaskId>,
    /// Stage that failed.
    pub kind: PollFailureKind,
    /// Rendered error message.
    pub message: String,
}

impl PollFailure {
    fn for_task(task_id: TaskId, kind: PollFailureKind, err: &impl fmt::Display) -> Self {
        Self {
            task_id: Some(task_id),
            kind,
            message: err.to_string(),
        }
    }
}

/// Summary returned by every poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Tasks inspected in this cycle.
    pub tasks_examined: usize,
    /// Tasks handed to the digest generator.
    pub tasks_triggered: usize,
    /// Tasks another writer claimed or moved on first.
    pub tasks_skipped: usize,
    /// Failures, one per affected task.
    pub errors: Vec<PollFailure>,
}

impl PollReport {
    /// Returns the number of failures recorded.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

enum TaskPollOutcome {
    InProgress,
    Triggered,
    Skipped,
}

/// Scans tasks awaiting their digest and triggers the complete ones.
#[derive(Clone)]
pub struct CompletionPoller<R, Q, P, G, C>
where
    R: ProcessingTaskRepository,
    Q: CompletionCountsSource,
    P: UserPreferences,
    G: DigestGenerator,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    oracle: CompletionOracle<Q>,
    trigger: DigestTriggerAdapter<R, P, G, C>,
    clock: Arc<C>,
}

impl<R, Q, P, G, C> CompletionPoller<R, Q, P, G, C>
where
    R: ProcessingTaskRepository,
    Q: CompletionCountsSource,
    P: UserPreferences,
    G: DigestGenerator,
    C: Clock + Send + Sync,
{
    /// Creates a poller.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        oracle: CompletionOracle<Q>,
        trigger: DigestTriggerAdapter<R, P, G, C>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            oracle,
            trigger,
            clock,
        }
    }

    /// Runs one poll cycle. Never fails; per-task errors are collected in the
    /// report.
    pub async fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();
        let tasks = match self.repository.find_awaiting_digest().await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(error = %err, "failed to load tasks awaiting completion");
                report.errors.push(PollFailure {
                    task_id: None,
                    kind: PollFailureKind::Load,
                    message: err.to_string(),
                });
                return report;
            }
        };
        debug!(count = tasks.len(), "loaded tasks awaiting completion");

        for entry in tasks {
            report.tasks_examined += 1;
            let outcome = match entry {
                Ok(task) => self.poll_task(task).await,
                Err(unreadable) => Err(unreadable_failure(&unreadable)),
            };
            match outcome {
                Ok(TaskPollOutcome::InProgress) => {}
                Ok(TaskPollOutcome::Triggered) => report.tasks_triggered += 1,
                Ok(TaskPollOutcome::Skipped) => report.tasks_skipped += 1,
                Err(failure) => report.errors.push(failure),
            }
        }

        info!(
            examined = report.tasks_examined,
            triggered = report.tasks_triggered,
            skipped = report.tasks_skipped,
            errors = report.error_count(),
            "completion poll finished"
        );
        report
    }

    async fn poll_task(&self, task: ProcessingTask) -> Result<TaskPollOutcome, PollFailure> {
        let task_id = task.id();
        let status = self.oracle.status(task_id).await.map_err(|err| {
            error!(%task_id, error = %err, "failed to fetch completion status");
            PollFailure::for_task(task_id, PollFailureKind::Oracle, &err)
        })?;
        debug!(
            %task_id,
            fetch = %status.fetch,
            processing = %status.processing,
            overall = %status.overall_status,
            "completion status"
        );

        let mut running = if task.status() == TaskStatus::Pending {
            if !status.has_sub_jobs() {
                debug!(%task_id, "pending task has no sub-jobs yet");
                return Ok(TaskPollOutcome::InProgress);
            }
            let Some(promoted) = self.promote(task).await? else {
                return Ok(TaskPollOutcome::Skipped);
            };
            promoted
        } else {
            task
        };

        if !status.is_complete() {
            log_remaining_work(task_id, &status);
            return Ok(TaskPollOutcome::InProgress);
        }

        let claimed_at = self.clock.utc();
        let claimed = self
            .repository
            .claim_digest_trigger(task_id, claimed_at)
            .await
            .map_err(|err| {
                error!(%task_id, error = %err, "failed to claim digest trigger");
                PollFailure::for_task(task_id, PollFailureKind::Claim, &err)
            })?;
        if !claimed {
            debug!(%task_id, "digest trigger already claimed elsewhere");
            return Ok(TaskPollOutcome::Skipped);
        }
        running
            .mark_digest_requested(claimed_at)
            .map_err(|err| PollFailure::for_task(task_id, PollFailureKind::Claim, &err))?;

        info!(
            %task_id,
            partial = status.has_partial_failure(),
            "task complete, triggering digest generation"
        );
        self.trigger
            .trigger(&running, &status)
            .await
            .map_err(|err| PollFailure::for_task(task_id, PollFailureKind::Trigger, &err))?;
        Ok(TaskPollOutcome::Triggered)
    }

    /// Moves a pending task to running. Returns the running task, or `None`
    /// when another writer moved it somewhere other than running first.
    async fn promote(
        &self,
        mut task: ProcessingTask,
    ) -> Result<Option<ProcessingTask>, PollFailure> {
        let task_id = task.id();
        task.mark_running(&*self.clock)
            .map_err(|err| promote_failure(task_id, &err))?;
        let promoted = self
            .repository
            .update_if_status(&task, TaskStatus::Pending)
            .await
            .map_err(|err| promote_failure(task_id, &err))?;
        if promoted {
            info!(%task_id, "sub-jobs registered, task marked running");
            return Ok(Some(task));
        }

        let current = self
            .repository
            .find_by_id(task_id)
            .await
            .map_err(|err| promote_failure(task_id, &err))?;
        debug!(%task_id, "pending task changed status before promotion");
        Ok(current.filter(|stored| stored.status() == TaskStatus::Running))
    }
}

fn promote_failure(task_id: TaskId, err: &impl fmt::Display) -> PollFailure {
    error!(%task_id, error = %err, "failed to mark pending task running");
    PollFailure::for_task(task_id, PollFailureKind::Promote, err)
}

fn unreadable_failure(unreadable: &UnreadableTask) -> PollFailure {
    error!(
        task_id = %unreadable.task_id,
        error = %unreadable.error,
        "failed to read stored task"
    );
    PollFailure::for_task(unreadable.task_id, PollFailureKind::Load, &unreadable.error)
}

fn log_remaining_work(task_id: TaskId, status: &CompletionStatus) {
    if !status.is_fetch_complete {
        info!(
            %task_id,
            remaining_fetch = status.fetch.remaining(),
            "task still has pending fetch jobs"
        );
    } else if !status.is_processing_complete {
        info!(
            %task_id,
            remaining_processing = status.processing.remaining(),
            "fetch complete, content items still processing"
        );
    } else {
        info!(%task_id, overall = %status.overall_status, "task still in progress");
    }
}

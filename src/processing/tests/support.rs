//! Shared fixtures for processing unit tests.

use crate::processing::{
    adapters::memory::{InMemoryProcessingTaskRepository, ManualClock},
    domain::{
        CompletionCounts, OwnerId, PhaseCounts, ProcessingTask, TaskConfig, TaskDomainError,
        TaskKind,
    },
};

/// Counts for a task whose phases are both finished.
pub(super) const fn finished_counts(fetch_failed: u64, processing_failed: u64) -> CompletionCounts {
    CompletionCounts::new(
        PhaseCounts::new(5, 5 - fetch_failed, fetch_failed),
        PhaseCounts::new(8, 8 - processing_failed, processing_failed),
    )
}

/// Counts for a task whose fetch phase is done and processing is not.
pub(super) const fn processing_counts() -> CompletionCounts {
    CompletionCounts::new(PhaseCounts::new(3, 3, 0), PhaseCounts::new(10, 7, 0))
}

/// Builds a pending task for `owner` created at the clock's current time.
pub(super) fn pending_task(owner: OwnerId, clock: &ManualClock) -> ProcessingTask {
    ProcessingTask::new(
        owner,
        TaskKind::ProcessAllSources,
        TaskConfig::default(),
        3,
        clock,
    )
}

/// Builds a running task for `owner` created at the clock's current time.
pub(super) fn running_task(
    owner: OwnerId,
    clock: &ManualClock,
) -> Result<ProcessingTask, TaskDomainError> {
    let mut task = pending_task(owner, clock);
    task.mark_running(clock)?;
    Ok(task)
}

/// Seeds a running task and returns it.
pub(super) fn seed_running(
    repository: &InMemoryProcessingTaskRepository,
    clock: &ManualClock,
) -> eyre::Result<ProcessingTask> {
    let task = running_task(OwnerId::new(), clock)?;
    repository.seed(task.clone())?;
    Ok(task)
}

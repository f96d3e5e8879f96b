//! Poll cycles across several owners over in-memory adapters.

use super::helpers::{Orchestration, orchestration};
use curator::processing::{
    domain::{CompletionCounts, OwnerId, PhaseCounts, ProcessingTask, TaskStatus},
    ports::{DigestGenerationError, ProcessingTaskRepository},
    services::{PollFailureKind, StartTaskRequest},
};
use rstest::rstest;

async fn running_task_for(
    orchestration: &Orchestration,
    owner: OwnerId,
) -> eyre::Result<ProcessingTask> {
    let task = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;
    Ok(orchestration.progress.register_sub_job(task.id()).await?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn poll_handles_each_owner_independently(orchestration: Orchestration) -> eyre::Result<()> {
    let finished = running_task_for(&orchestration, OwnerId::new()).await?;
    let busy = running_task_for(&orchestration, OwnerId::new()).await?;
    let broken = running_task_for(&orchestration, OwnerId::new()).await?;
    orchestration.counts.set_counts(
        finished.id(),
        CompletionCounts::new(PhaseCounts::new(5, 4, 1), PhaseCounts::new(9, 9, 0)),
    )?;
    orchestration.counts.set_counts(
        busy.id(),
        CompletionCounts::new(PhaseCounts::new(5, 5, 0), PhaseCounts::new(9, 2, 0)),
    )?;
    orchestration
        .counts
        .fail_for(broken.id(), "statement timeout")?;

    let report = orchestration.poller.poll_once().await;

    assert_eq!(report.tasks_examined, 3);
    assert_eq!(report.tasks_triggered, 1);
    assert_eq!(report.error_count(), 1);
    assert!(report.errors.iter().all(|failure| {
        failure.task_id == Some(broken.id()) && failure.kind == PollFailureKind::Oracle
    }));
    let requests = orchestration.generator.requests()?;
    assert!(requests
        .iter()
        .all(|request| request.task_id == finished.id() && request.partial));

    let pollable = orchestration
        .repository
        .find_awaiting_digest()
        .await?
        .into_iter()
        .map(|entry| entry.map(|task| task.id()))
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(pollable.len(), 2);
    assert!(pollable.contains(&busy.id()));
    assert!(pollable.contains(&broken.id()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_trigger_frees_owner_for_new_task(orchestration: Orchestration) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let task = running_task_for(&orchestration, owner).await?;
    orchestration
        .counts
        .set_counts(task.id(), CompletionCounts::default())?;
    orchestration
        .generator
        .fail_with(DigestGenerationError::new("upstream 503"))?;

    let report = orchestration.poller.poll_once().await;

    assert_eq!(report.error_count(), 1);
    let stored = orchestration
        .repository
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task should exist"))?;
    assert_eq!(stored.status(), TaskStatus::Failed);
    let replacement = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;
    assert_eq!(replacement.status(), TaskStatus::Pending);
    Ok(())
}

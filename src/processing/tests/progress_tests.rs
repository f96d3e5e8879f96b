//! Unit tests for sub-job and digest delivery signals.

use super::support::{pending_task, seed_running};
use crate::processing::{
    adapters::memory::{InMemoryProcessingTaskRepository, ManualClock},
    domain::{OwnerId, SourceId, TaskDomainError, TaskResult, TaskStatus},
    ports::TaskRepositoryError,
    services::{DigestDelivery, TaskProgressError, TaskProgressService},
};
use chrono::TimeDelta;
use mockable::Clock;
use rstest::{fixture, rstest};
use std::sync::Arc;

type TestService = TaskProgressService<InMemoryProcessingTaskRepository, ManualClock>;

struct Harness {
    repository: Arc<InMemoryProcessingTaskRepository>,
    clock: Arc<ManualClock>,
    service: TestService,
}

#[fixture]
fn harness() -> Harness {
    let repository = Arc::new(InMemoryProcessingTaskRepository::new());
    let clock = Arc::new(ManualClock::default());
    let service = TaskProgressService::new(Arc::clone(&repository), Arc::clone(&clock));
    Harness {
        repository,
        clock,
        service,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_sub_job_moves_task_to_running(harness: Harness) -> eyre::Result<()> {
    let task = pending_task(OwnerId::new(), &harness.clock);
    harness.repository.seed(task.clone())?;
    harness.clock.advance(TimeDelta::seconds(5));

    let running = harness.service.register_sub_job(task.id()).await?;
    let again = harness.service.register_sub_job(task.id()).await?;

    assert_eq!(running.status(), TaskStatus::Running);
    assert_eq!(running.updated_at(), harness.clock.utc());
    assert_eq!(again, running);
    assert_eq!(harness.service.get(task.id()).await?, running);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sub_job_registration_is_rejected_for_finished_tasks(
    harness: Harness,
) -> eyre::Result<()> {
    let task = seed_running(&harness.repository, &harness.clock)?;
    harness
        .service
        .mark_digest_delivered(task.id(), DigestDelivery::default())
        .await?;

    let result = harness.service.register_sub_job(task.id()).await;

    assert!(matches!(
        result,
        Err(TaskProgressError::Domain(
            TaskDomainError::InvalidStateTransition {
                from: TaskStatus::Complete,
                ..
            }
        ))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_signals_accumulate(harness: Harness) -> eyre::Result<()> {
    let task = seed_running(&harness.repository, &harness.clock)?;
    let processed = SourceId::new();
    let skipped = SourceId::new();

    harness
        .service
        .record_source_processed(task.id(), processed)
        .await?;
    harness
        .service
        .record_source_processed(task.id(), processed)
        .await?;
    let updated = harness
        .service
        .record_source_skipped(task.id(), skipped, "no new items")
        .await?;

    assert_eq!(updated.progress().current(), 2);
    assert_eq!(updated.progress().processed_sources(), &[processed]);
    assert!(updated.progress().has_seen(skipped));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_survives_later_status_writes(harness: Harness) -> eyre::Result<()> {
    let task = seed_running(&harness.repository, &harness.clock)?;
    harness
        .service
        .record_source_processed(task.id(), SourceId::new())
        .await?;

    let completed = harness
        .service
        .mark_digest_delivered(
            task.id(),
            DigestDelivery {
                digest_id: Some("digest-42".to_owned()),
                partial: true,
            },
        )
        .await?;

    let stored = harness.service.get(task.id()).await?;
    assert_eq!(stored.progress().current(), 1);
    assert_eq!(stored.status(), TaskStatus::Complete);
    assert_eq!(
        completed.result(),
        Some(&TaskResult::DigestGenerated {
            digest_id: Some("digest-42".to_owned()),
            partial: true,
        })
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_is_rejected_once_terminal(harness: Harness) -> eyre::Result<()> {
    let task = seed_running(&harness.repository, &harness.clock)?;
    harness
        .service
        .mark_digest_delivered(task.id(), DigestDelivery::default())
        .await?;

    let result = harness
        .service
        .record_source_processed(task.id(), SourceId::new())
        .await;

    assert!(matches!(
        result,
        Err(TaskProgressError::Repository(TaskRepositoryError::Domain(
            TaskDomainError::ProgressOnTerminalTask { .. }
        )))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_not_found(harness: Harness) {
    let missing = crate::processing::domain::TaskId::new();

    let result = harness.service.register_sub_job(missing).await;

    assert!(matches!(result, Err(TaskProgressError::NotFound(id)) if id == missing));
}

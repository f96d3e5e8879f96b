//! End-to-end task lifecycle over in-memory adapters.

use super::helpers::{Orchestration, orchestration};
use chrono::TimeDelta;
use curator::{
    config::OrchestrationConfig,
    processing::{
        domain::{
            CompletionCounts, OwnerId, PhaseCounts, SourceId, TaskResult, TaskStatus, TimeRange,
        },
        ports::ProcessingTaskRepository,
        services::{AdmissionError, DigestDelivery, StartTaskRequest},
    },
};
use mockable::Clock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_runs_from_admission_to_delivered_digest(
    orchestration: Orchestration,
) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let sources = [SourceId::new(), SourceId::new()];
    orchestration.sources.set_active_sources(owner, 2)?;
    orchestration
        .preferences
        .set_timezone(owner, "Asia/Tokyo")?;

    let task = orchestration
        .admission
        .start(StartTaskRequest::new(owner).with_time_range(TimeRange::Day))
        .await?;
    orchestration.progress.register_sub_job(task.id()).await?;
    orchestration
        .counts
        .set_counts(
            task.id(),
            CompletionCounts::new(PhaseCounts::new(2, 1, 0), PhaseCounts::default()),
        )?;

    let early = orchestration.poller.poll_once().await;
    assert_eq!(early.tasks_examined, 1);
    assert_eq!(early.tasks_triggered, 0);

    for source in sources {
        orchestration
            .progress
            .record_source_processed(task.id(), source)
            .await?;
    }
    orchestration.counts.set_counts(
        task.id(),
        CompletionCounts::new(PhaseCounts::new(2, 2, 0), PhaseCounts::new(6, 6, 0)),
    )?;

    let ready = orchestration.poller.poll_once().await;
    assert_eq!(ready.tasks_triggered, 1);
    let requests = orchestration.generator.requests()?;
    assert_eq!(requests.len(), 1);
    assert!(requests.iter().all(|request| {
        request.task_id == task.id()
            && request.time_range == TimeRange::Day
            && request.timezone == "Asia/Tokyo"
            && !request.partial
    }));

    let blocked = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await;
    assert!(matches!(blocked, Err(AdmissionError::Conflict { .. })));

    let delivered = orchestration
        .progress
        .mark_digest_delivered(
            task.id(),
            DigestDelivery {
                digest_id: Some("digest-7".to_owned()),
                partial: false,
            },
        )
        .await?;
    assert_eq!(delivered.status(), TaskStatus::Complete);
    assert_eq!(delivered.progress().current(), 2);
    assert!(matches!(
        delivered.result(),
        Some(TaskResult::DigestGenerated { partial: false, .. })
    ));

    let next = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;
    assert_ne!(next.id(), task.id());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn crash_after_claim_is_recovered_by_staleness(
    orchestration: Orchestration,
) -> eyre::Result<()> {
    let owner = OwnerId::new();
    let task = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;
    orchestration.progress.register_sub_job(task.id()).await?;
    orchestration
        .repository
        .claim_digest_trigger(task.id(), orchestration.clock.utc())
        .await?;

    orchestration.clock.advance(TimeDelta::minutes(75));
    let replacement = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;

    let stranded = orchestration
        .repository
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("stranded task should exist"))?;
    assert_eq!(stranded.status(), TaskStatus::Failed);
    assert_eq!(replacement.status(), TaskStatus::Pending);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_threshold_governs_reclamation() -> eyre::Result<()> {
    let config = OrchestrationConfig::from_env_with(|key| {
        (key == "CURATOR_STALENESS_THRESHOLD").then(|| "10m".to_owned())
    })?;
    let orchestration = Orchestration::with_config(&config);
    let owner = OwnerId::new();
    orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await?;

    orchestration.clock.advance(TimeDelta::minutes(11));
    let replacement = orchestration
        .admission
        .start(StartTaskRequest::new(owner))
        .await;

    assert!(replacement.is_ok());
    Ok(())
}

//! Given steps for completion polling BDD scenarios.

use super::world::PollWorld;
use curator::processing::{
    domain::{
        CompletionCounts, OwnerId, PhaseCounts, ProcessingTask, TaskConfig, TaskId, TaskKind,
    },
    ports::DigestGenerationError,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn current_task_id(world: &PollWorld) -> Result<TaskId, eyre::Report> {
    world
        .task
        .as_ref()
        .map(ProcessingTask::id)
        .ok_or_else(|| eyre::eyre!("missing running task in scenario world"))
}

fn publish_counts(world: &PollWorld) -> Result<(), eyre::Report> {
    let task_id = current_task_id(world)?;
    world
        .counts
        .set_counts(task_id, CompletionCounts::new(world.fetch, world.processing))
        .wrap_err("publish completion counts")?;
    Ok(())
}

#[given("a running processing task")]
fn running_task(world: &mut PollWorld) -> Result<(), eyre::Report> {
    let mut task = ProcessingTask::new(
        OwnerId::new(),
        TaskKind::ProcessAllSources,
        TaskConfig::default(),
        2,
        &*world.clock,
    );
    task.mark_running(&*world.clock)
        .wrap_err("start scenario task")?;
    world
        .repository
        .seed(task.clone())
        .wrap_err("seed scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given("a pending processing task")]
fn pending_task(world: &mut PollWorld) -> Result<(), eyre::Report> {
    let task = ProcessingTask::new(
        OwnerId::new(),
        TaskKind::ProcessAllSources,
        TaskConfig::default(),
        2,
        &*world.clock,
    );
    world
        .repository
        .seed(task.clone())
        .wrap_err("seed scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given(
    "its fetch jobs are {total:u64} total, {completed:u64} completed and {failed:u64} failed"
)]
fn fetch_jobs(
    world: &mut PollWorld,
    total: u64,
    completed: u64,
    failed: u64,
) -> Result<(), eyre::Report> {
    world.fetch = PhaseCounts::new(total, completed, failed);
    publish_counts(world)
}

#[given(
    "its content items are {total:u64} total, {processed:u64} processed and {failed:u64} failed"
)]
fn content_items(
    world: &mut PollWorld,
    total: u64,
    processed: u64,
    failed: u64,
) -> Result<(), eyre::Report> {
    world.processing = PhaseCounts::new(total, processed, failed);
    publish_counts(world)
}

#[given(r#"the digest generator fails with "{message}""#)]
fn generator_fails(world: &mut PollWorld, message: String) -> Result<(), eyre::Report> {
    world
        .generator
        .fail_with(DigestGenerationError::new(message))
        .wrap_err("configure failing generator")?;
    Ok(())
}

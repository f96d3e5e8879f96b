//! Then steps for completion polling BDD scenarios.

use super::world::{PollWorld, run_async};
use curator::processing::{
    domain::{TaskResult, TaskStatus},
    ports::ProcessingTaskRepository,
};
use rstest_bdd_macros::then;

#[then("exactly {count:usize} digest request was made")]
fn digest_requests_made(world: &PollWorld, count: usize) -> Result<(), eyre::Report> {
    let requests = world.generator.requests()?;
    if requests.len() != count {
        return Err(eyre::eyre!(
            "expected {count} digest requests, found {}",
            requests.len()
        ));
    }
    Ok(())
}

#[then("the digest request is partial")]
fn digest_request_is_partial(world: &PollWorld) -> Result<(), eyre::Report> {
    let requests = world.generator.requests()?;
    if requests.is_empty() || !requests.iter().all(|request| request.partial) {
        return Err(eyre::eyre!("expected partial digest request, got {requests:?}"));
    }
    Ok(())
}

#[then("the task still awaits its digest")]
fn task_still_awaits_digest(world: &PollWorld) -> Result<(), eyre::Report> {
    let pollable = run_async(world.repository.find_awaiting_digest())?;
    let task = world
        .task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing running task in scenario world"))?;
    let listed = pollable
        .iter()
        .any(|candidate| candidate.as_ref().is_ok_and(|found| found.id() == task.id()));
    if !listed {
        return Err(eyre::eyre!("task {} is no longer pollable", task.id()));
    }
    Ok(())
}

#[then("the task status is now {state}")]
fn task_status_is(world: &PollWorld, state: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world
        .task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let stored = run_async(world.repository.find_by_id(task.id()))?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;
    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

#[then(r#"the task is "{state}" with message "{message}""#)]
fn task_has_failure(
    world: &PollWorld,
    state: String,
    message: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world
        .task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing running task in scenario world"))?;
    let stored = run_async(world.repository.find_by_id(task.id()))?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;

    let recorded = stored
        .result()
        .and_then(TaskResult::failure)
        .map(|failure| failure.message.clone());
    if stored.status() != expected || recorded.as_deref() != Some(message.as_str()) {
        return Err(eyre::eyre!(
            "expected {expected} with {message:?}, found {} with {recorded:?}",
            stored.status()
        ));
    }
    Ok(())
}

//! Then steps for task admission BDD scenarios.

use super::world::{AdmissionWorld, run_async};
use curator::processing::{
    domain::{STALE_TASK_MESSAGE, TaskResult, TaskStatus},
    ports::ProcessingTaskRepository,
    services::AdmissionError,
};
use rstest_bdd_macros::then;

#[then("admission succeeds")]
fn admission_succeeds(world: &AdmissionWorld) -> Result<(), eyre::Report> {
    match &world.last_result {
        Some(Ok(_)) => Ok(()),
        other => Err(eyre::eyre!("expected admitted task, got {other:?}")),
    }
}

#[then(r#"the new task is "{status}" and sized for {total:u32} sources"#)]
fn new_task_is(world: &AdmissionWorld, status: String, total: u32) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let Some(Ok(task)) = &world.last_result else {
        return Err(eyre::eyre!("missing admitted task"));
    };

    if task.status() != expected || task.progress().total() != total {
        return Err(eyre::eyre!(
            "expected {expected} task sized for {total}, found {} sized for {}",
            task.status(),
            task.progress().total()
        ));
    }
    Ok(())
}

#[then(r#"admission is refused because the earlier task is "{state}""#)]
fn admission_refused(world: &AdmissionWorld, state: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(state.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let earlier = world
        .earlier_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing earlier task"))?;

    match &world.last_result {
        Some(Err(AdmissionError::Conflict { task_id, status }))
            if *task_id == earlier.id() && *status == expected =>
        {
            Ok(())
        }
        other => Err(eyre::eyre!("expected conflict on earlier task, got {other:?}")),
    }
}

#[then(r#"the earlier task is "{status}" with the stale cleanup message"#)]
fn earlier_task_reclaimed(world: &AdmissionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let earlier = world
        .earlier_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing earlier task"))?;
    let stored = run_async(world.repository.find_by_id(earlier.id()))?
        .ok_or_else(|| eyre::eyre!("earlier task disappeared"))?;

    let message = stored
        .result()
        .and_then(TaskResult::failure)
        .map(|failure| failure.message.as_str());
    if stored.status() != expected || message != Some(STALE_TASK_MESSAGE) {
        return Err(eyre::eyre!(
            "expected {expected} task with stale message, found {} with {message:?}",
            stored.status()
        ));
    }
    Ok(())
}

//! Given steps for task admission BDD scenarios.

use super::world::AdmissionWorld;
use chrono::TimeDelta;
use curator::processing::domain::{ProcessingTask, TaskConfig, TaskKind};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("an owner with {count:u32} active sources")]
fn owner_with_sources(world: &mut AdmissionWorld, count: u32) -> Result<(), eyre::Report> {
    world
        .sources
        .set_active_sources(world.owner, count)
        .wrap_err("configure active sources")?;
    Ok(())
}

#[given("the owner has a running task started {minutes:i64} minutes ago")]
fn owner_has_running_task(world: &mut AdmissionWorld, minutes: i64) -> Result<(), eyre::Report> {
    let mut task = ProcessingTask::new(
        world.owner,
        TaskKind::ProcessAllSources,
        TaskConfig::default(),
        1,
        &*world.clock,
    );
    task.mark_running(&*world.clock)
        .wrap_err("start earlier task")?;
    world
        .repository
        .seed(task.clone())
        .wrap_err("seed earlier task")?;
    world.clock.advance(TimeDelta::minutes(minutes));
    world.earlier_task = Some(task);
    Ok(())
}

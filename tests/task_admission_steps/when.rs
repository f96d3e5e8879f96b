//! When steps for task admission BDD scenarios.

use super::world::{AdmissionWorld, run_async};
use curator::processing::services::StartTaskRequest;
use rstest_bdd_macros::when;

#[when("the owner starts processing")]
fn owner_starts_processing(world: &mut AdmissionWorld) {
    let result = run_async(world.service.start(StartTaskRequest::new(world.owner)));
    world.last_result = Some(result);
}

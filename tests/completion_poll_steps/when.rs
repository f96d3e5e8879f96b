//! When steps for completion polling BDD scenarios.

use super::world::{PollWorld, run_async};
use rstest_bdd_macros::when;

#[when("the completion poller runs {runs:u32} times")]
fn poller_runs(world: &mut PollWorld, runs: u32) {
    for _ in 0..runs {
        let report = run_async(world.poller.poll_once());
        world.reports.push(report);
    }
}

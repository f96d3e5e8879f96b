//! Shared world state for task admission BDD scenarios.

use std::sync::Arc;

use curator::processing::{
    adapters::memory::{InMemoryProcessingTaskRepository, InMemorySourceRegistry, ManualClock},
    domain::{OwnerId, ProcessingTask},
    services::{AdmissionError, TaskAdmissionService},
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestAdmissionService =
    TaskAdmissionService<InMemoryProcessingTaskRepository, InMemorySourceRegistry, ManualClock>;

/// Scenario world for admission behaviour tests.
pub struct AdmissionWorld {
    pub repository: Arc<InMemoryProcessingTaskRepository>,
    pub sources: Arc<InMemorySourceRegistry>,
    pub clock: Arc<ManualClock>,
    pub service: TestAdmissionService,
    pub owner: OwnerId,
    pub earlier_task: Option<ProcessingTask>,
    pub last_result: Option<Result<ProcessingTask, AdmissionError>>,
}

impl AdmissionWorld {
    /// Creates a world for a fresh owner with no tasks.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryProcessingTaskRepository::new());
        let sources = Arc::new(InMemorySourceRegistry::new());
        let clock = Arc::new(ManualClock::default());
        let service = TaskAdmissionService::new(
            Arc::clone(&repository),
            Arc::clone(&sources),
            Arc::clone(&clock),
        );

        Self {
            repository,
            sources,
            clock,
            service,
            owner: OwnerId::new(),
            earlier_task: None,
            last_result: None,
        }
    }
}

impl Default for AdmissionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> AdmissionWorld {
    AdmissionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

//! Shared world state for completion polling BDD scenarios.

use std::sync::Arc;

use curator::processing::{
    adapters::memory::{
        InMemoryCompletionCounts, InMemoryProcessingTaskRepository, InMemoryUserPreferences,
        ManualClock, RecordingDigestGenerator,
    },
    domain::{PhaseCounts, ProcessingTask},
    services::{CompletionOracle, CompletionPoller, DigestTriggerAdapter, PollReport},
};
use rstest::fixture;

/// Poller type used by the BDD world.
pub type TestPoller = CompletionPoller<
    InMemoryProcessingTaskRepository,
    InMemoryCompletionCounts,
    InMemoryUserPreferences,
    RecordingDigestGenerator,
    ManualClock,
>;

/// Scenario world for completion polling behaviour tests.
pub struct PollWorld {
    pub repository: Arc<InMemoryProcessingTaskRepository>,
    pub counts: Arc<InMemoryCompletionCounts>,
    pub generator: Arc<RecordingDigestGenerator>,
    pub clock: Arc<ManualClock>,
    pub poller: TestPoller,
    pub task: Option<ProcessingTask>,
    pub fetch: PhaseCounts,
    pub processing: PhaseCounts,
    pub reports: Vec<PollReport>,
}

impl PollWorld {
    /// Creates a world with an empty task store.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryProcessingTaskRepository::new());
        let counts = Arc::new(InMemoryCompletionCounts::new());
        let generator = Arc::new(RecordingDigestGenerator::new());
        let clock = Arc::new(ManualClock::default());
        let trigger = DigestTriggerAdapter::new(
            Arc::clone(&repository),
            Arc::new(InMemoryUserPreferences::new()),
            Arc::clone(&generator),
            Arc::clone(&clock),
        );
        let poller = CompletionPoller::new(
            Arc::clone(&repository),
            CompletionOracle::new(Arc::clone(&counts)),
            trigger,
            Arc::clone(&clock),
        );

        Self {
            repository,
            counts,
            generator,
            clock,
            poller,
            task: None,
            fetch: PhaseCounts::default(),
            processing: PhaseCounts::default(),
            reports: Vec::new(),
        }
    }
}

impl Default for PollWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PollWorld {
    PollWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

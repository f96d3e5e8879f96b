//! Shared wiring for in-memory orchestration integration tests.

use curator::{
    config::OrchestrationConfig,
    processing::{
        adapters::memory::{
            InMemoryCompletionCounts, InMemoryProcessingTaskRepository, InMemorySourceRegistry,
            InMemoryUserPreferences, ManualClock, RecordingDigestGenerator,
        },
        services::{
            CompletionOracle, CompletionPoller, DigestTriggerAdapter, TaskAdmissionService,
            TaskProgressService,
        },
    },
};
use rstest::fixture;
use std::sync::Arc;

/// Admission service over in-memory adapters.
pub type Admission =
    TaskAdmissionService<InMemoryProcessingTaskRepository, InMemorySourceRegistry, ManualClock>;

/// Poller over in-memory adapters.
pub type Poller = CompletionPoller<
    InMemoryProcessingTaskRepository,
    InMemoryCompletionCounts,
    InMemoryUserPreferences,
    RecordingDigestGenerator,
    ManualClock,
>;

/// Progress service over in-memory adapters.
pub type Progress = TaskProgressService<InMemoryProcessingTaskRepository, ManualClock>;

/// Every collaborator and service of one orchestration deployment.
pub struct Orchestration {
    pub repository: Arc<InMemoryProcessingTaskRepository>,
    pub sources: Arc<InMemorySourceRegistry>,
    pub preferences: Arc<InMemoryUserPreferences>,
    pub counts: Arc<InMemoryCompletionCounts>,
    pub generator: Arc<RecordingDigestGenerator>,
    pub clock: Arc<ManualClock>,
    pub admission: Admission,
    pub poller: Poller,
    pub progress: Progress,
}

impl Orchestration {
    /// Wires the services using `config`.
    #[must_use]
    pub fn with_config(config: &OrchestrationConfig) -> Self {
        let repository = Arc::new(InMemoryProcessingTaskRepository::new());
        let sources = Arc::new(InMemorySourceRegistry::new());
        let preferences = Arc::new(InMemoryUserPreferences::new());
        let counts = Arc::new(InMemoryCompletionCounts::new());
        let generator = Arc::new(RecordingDigestGenerator::new());
        let clock = Arc::new(ManualClock::default());

        let admission = TaskAdmissionService::new(
            Arc::clone(&repository),
            Arc::clone(&sources),
            Arc::clone(&clock),
        )
        .with_staleness_threshold(config.staleness_threshold);
        let trigger = DigestTriggerAdapter::new(
            Arc::clone(&repository),
            Arc::clone(&preferences),
            Arc::clone(&generator),
            Arc::clone(&clock),
        )
        .with_default_timezone(config.default_timezone.clone());
        let poller = CompletionPoller::new(
            Arc::clone(&repository),
            CompletionOracle::new(Arc::clone(&counts)),
            trigger,
            Arc::clone(&clock),
        );
        let progress = TaskProgressService::new(Arc::clone(&repository), Arc::clone(&clock));

        Self {
            repository,
            sources,
            preferences,
            counts,
            generator,
            clock,
            admission,
            poller,
            progress,
        }
    }
}

/// Provides an orchestration wired with default configuration.
#[fixture]
pub fn orchestration() -> Orchestration {
    Orchestration::with_config(&OrchestrationConfig::default())
}

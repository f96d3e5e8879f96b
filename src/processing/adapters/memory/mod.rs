//! In-memory adapters for processing task orchestration.

mod clock;
mod collaborators;
mod task;

pub use clock::ManualClock;
pub use collaborators::{
    InMemoryCompletionCounts, InMemorySourceRegistry, InMemoryUserPreferences,
    RecordingDigestGenerator,
};
pub use task::InMemoryProcessingTaskRepository;

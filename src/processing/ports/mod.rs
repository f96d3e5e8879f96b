//! Port contracts for processing task orchestration.
//!
//! Ports define infrastructure-agnostic interfaces for the task store and
//! for each external collaborator the orchestration core consumes.

pub mod completion;
pub mod digest;
pub mod preferences;
pub mod repository;
pub mod sources;

pub use completion::{CompletionCountsSource, CompletionQueryError, CompletionQueryResult};
pub use digest::{DigestAck, DigestGenerationError, DigestGenerator, DigestRequest};
pub use preferences::{PreferenceLookupError, UserPreferences};
pub use repository::{
    PollableTask, ProcessingTaskRepository, TaskRepositoryError, TaskRepositoryResult,
    UnreadableTask,
};
pub use sources::{ActiveSourceCounter, SourceCountError};

//! Domain model for processing task orchestration.
//!
//! The processing domain models the task record, its status state machine,
//! and the completion view derived from sub-job counts, while keeping all
//! infrastructure concerns outside of the domain boundary.

mod completion;
mod config;
mod error;
mod ids;
mod progress;
mod result;
mod status;
mod task;

pub use completion::{CompletionCounts, CompletionStatus, OverallStatus, PhaseCounts};
pub use config::{TaskConfig, TaskKind, TimeRange};
pub use error::{ParseTaskKindError, ParseTaskStatusError, ParseTimeRangeError, TaskDomainError};
pub use ids::{OwnerId, SourceId, TaskId};
pub use progress::{ProgressUpdate, SkippedSource, TaskProgress};
pub use result::{FailureReason, STALE_TASK_MESSAGE, TaskFailure, TaskResult};
pub use status::TaskStatus;
pub use task::{PersistedTaskData, ProcessingTask};

//! Application services for processing task orchestration.

mod admission;
mod oracle;
mod poller;
mod progress;
mod trigger;

pub use admission::{
    AdmissionError, AdmissionResult, DEFAULT_STALENESS_THRESHOLD, StartTaskRequest,
    TaskAdmissionService,
};
pub use oracle::{CompletionOracle, CompletionOracleError};
pub use poller::{CompletionPoller, PollFailure, PollFailureKind, PollReport};
pub use progress::{DigestDelivery, TaskProgressError, TaskProgressResult, TaskProgressService};
pub use trigger::{DEFAULT_TIMEZONE, DigestTriggerAdapter, TriggerError};

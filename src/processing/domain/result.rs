//! Terminal task payloads.

use super::CompletionStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message recorded when a stale task is reclaimed.
pub const STALE_TASK_MESSAGE: &str = "Task cleaned up due to timeout or stale state";

/// Why a task ended in the failed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The task outlived the staleness threshold without finishing.
    StaleTimeout,
    /// The digest generation collaborator rejected or failed the request.
    DigestInvocation,
}

/// Structured failure detail stored in a failed task's result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Failure classification.
    pub reason: FailureReason,
    /// Human-readable message.
    pub message: String,
    /// Optional machine context supplied by the failing party.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Phase-by-phase snapshot at the time of failure, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<CompletionStatus>,
}

impl TaskFailure {
    /// Builds the failure recorded by stale-task reclamation.
    #[must_use]
    pub fn stale(age_seconds: i64) -> Self {
        Self {
            reason: FailureReason::StaleTimeout,
            message: STALE_TASK_MESSAGE.to_owned(),
            context: Some(json!({ "age_seconds": age_seconds })),
            completion: None,
        }
    }

    /// Builds the failure recorded when digest generation fails.
    #[must_use]
    pub fn digest_invocation(
        message: &str,
        context: Option<Value>,
        completion: CompletionStatus,
    ) -> Self {
        Self {
            reason: FailureReason::DigestInvocation,
            message: format!("Digest generation failed: {message}"),
            context,
            completion: Some(completion),
        }
    }
}

/// Terminal payload of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskResult {
    /// The digest subsystem delivered a digest.
    DigestGenerated {
        /// Identifier of the generated digest, when reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        digest_id: Option<String>,
        /// Whether some sub-jobs failed and the digest is partial.
        partial: bool,
    },
    /// The task failed.
    Failed(TaskFailure),
}

impl TaskResult {
    /// Returns the failure detail when the result is a failure.
    #[must_use]
    pub const fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::DigestGenerated { .. } => None,
        }
    }
}

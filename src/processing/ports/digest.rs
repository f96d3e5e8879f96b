//! Port for the digest-generation subsystem.

use crate::processing::domain::{OwnerId, TaskId, TimeRange};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Parameters sent to the digest generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRequest {
    /// Owner the digest is built for.
    pub owner: OwnerId,
    /// Task whose content feeds the digest.
    pub task_id: TaskId,
    /// Period the digest covers.
    pub time_range: TimeRange,
    /// Whether some sub-jobs failed.
    pub partial: bool,
    /// IANA timezone used to render the digest.
    pub timezone: String,
}

/// Acknowledgement returned when the generator accepts a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestAck {
    /// Reference the generator assigned to the request, if any.
    pub reference: Option<String>,
}

/// Invokes digest generation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DigestGenerator: Send + Sync {
    /// Requests a digest.
    ///
    /// # Errors
    ///
    /// Returns [`DigestGenerationError`] when the generator rejects or fails
    /// the request.
    async fn generate_digest(
        &self,
        request: &DigestRequest,
    ) -> Result<DigestAck, DigestGenerationError>;
}

/// Failure reported by the digest generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct DigestGenerationError {
    /// Human-readable failure message.
    pub message: String,
    /// Optional machine context.
    pub context: Option<Value>,
}

impl DigestGenerationError {
    /// Creates an error with a message only.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
        }
    }

    /// Attaches machine context.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

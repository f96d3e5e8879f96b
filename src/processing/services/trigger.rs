//! Downstream trigger: hands a complete task to the digest generator.

use crate::processing::{
    domain::{CompletionStatus, OwnerId, ProcessingTask, TaskDomainError, TaskFailure},
    ports::{
        DigestAck, DigestGenerationError, DigestGenerator, DigestRequest,
        ProcessingTaskRepository, TaskRepositoryError, UserPreferences,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Timezone used when the owner has none configured.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Errors returned by the trigger adapter.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The digest generator failed; the task was marked failed.
    #[error(transparent)]
    Digest(#[from] DigestGenerationError),
    /// The digest generator failed and recording the failure also failed.
    #[error("{source}; additionally failed to record task failure: {record_error}")]
    Unrecorded {
        /// Digest generator failure.
        source: DigestGenerationError,
        /// Repository failure while recording it.
        record_error: TaskRepositoryError,
    },
    /// The task could not transition to failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
}

/// Invokes the digest generator for complete tasks and maps failures back
/// onto task state.
///
/// A successful invocation does not complete the task: the digest
/// subsystem reports delivery separately.
#[derive(Clone)]
pub struct DigestTriggerAdapter<R, P, G, C>
where
    R: ProcessingTaskRepository,
    P: UserPreferences,
    G: DigestGenerator,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    preferences: Arc<P>,
    generator: Arc<G>,
    clock: Arc<C>,
    default_timezone: String,
}

impl<R, P, G, C> DigestTriggerAdapter<R, P, G, C>
where
    R: ProcessingTaskRepository,
    P: UserPreferences,
    G: DigestGenerator,
    C: Clock + Send + Sync,
{
    /// Creates a trigger adapter that falls back to UTC.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        preferences: Arc<P>,
        generator: Arc<G>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            preferences,
            generator,
            clock,
            default_timezone: DEFAULT_TIMEZONE.to_owned(),
        }
    }

    /// Overrides the fallback timezone.
    #[must_use]
    pub fn with_default_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    /// Requests a digest for a task whose phases are complete.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Digest`] after marking the task failed when
    /// the generator fails, or [`TriggerError::Unrecorded`] when the failure
    /// could not be persisted either.
    pub async fn trigger(
        &self,
        task: &ProcessingTask,
        status: &CompletionStatus,
    ) -> Result<DigestAck, TriggerError> {
        let request = DigestRequest {
            owner: task.owner(),
            task_id: task.id(),
            time_range: task.config().time_range,
            partial: status.has_partial_failure(),
            timezone: self.resolve_timezone(task.owner()).await,
        };

        match self.generator.generate_digest(&request).await {
            Ok(ack) => {
                info!(
                    task_id = %task.id(),
                    partial = request.partial,
                    timezone = %request.timezone,
                    reference = ?ack.reference,
                    "triggered digest generation"
                );
                Ok(ack)
            }
            Err(err) => {
                error!(task_id = %task.id(), error = %err, "digest generation failed");
                self.record_failure(task, &err, status).await?;
                Err(TriggerError::Digest(err))
            }
        }
    }

    async fn resolve_timezone(&self, owner: OwnerId) -> String {
        match self.preferences.timezone(owner).await {
            Ok(Some(timezone)) if !timezone.trim().is_empty() => timezone.trim().to_owned(),
            Ok(_) => self.default_timezone.clone(),
            Err(err) => {
                warn!(%owner, error = %err, "timezone lookup failed, using default");
                self.default_timezone.clone()
            }
        }
    }

    async fn record_failure(
        &self,
        task: &ProcessingTask,
        err: &DigestGenerationError,
        status: &CompletionStatus,
    ) -> Result<(), TriggerError> {
        let mut failed = task.clone();
        let expected = failed.status();
        failed.fail(
            TaskFailure::digest_invocation(&err.message, err.context.clone(), *status),
            &*self.clock,
        )?;

        match self.repository.update_if_status(&failed, expected).await {
            Ok(true) => {
                info!(task_id = %task.id(), "task marked failed after digest error");
                Ok(())
            }
            Ok(false) => {
                warn!(task_id = %task.id(), "task changed status before failure was recorded");
                Ok(())
            }
            Err(record_error) => {
                error!(
                    task_id = %task.id(),
                    error = %record_error,
                    "failed to record task failure"
                );
                Err(TriggerError::Unrecorded {
                    source: err.clone(),
                    record_error,
                })
            }
        }
    }
}

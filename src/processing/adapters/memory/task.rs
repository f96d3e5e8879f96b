//! In-memory repository for processing tasks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::processing::{
    domain::{OwnerId, PersistedTaskData, ProcessingTask, ProgressUpdate, TaskId, TaskStatus},
    ports::{PollableTask, ProcessingTaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Every operation runs under a single lock, so the active-task check on
/// insert and all conditional writes are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessingTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, ProcessingTask>,
}

impl InMemoryTaskState {
    fn active_for_owner(&self, owner: OwnerId) -> Option<&ProcessingTask> {
        self.tasks
            .values()
            .find(|task| task.owner() == owner && task.status().is_active())
    }
}

impl InMemoryProcessingTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a task without any checks.
    ///
    /// Intended for seeding fixtures that bypass admission rules.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn seed(&self, task: ProcessingTask) -> TaskRepositoryResult<()> {
        self.write()?.tasks.insert(task.id(), task);
        Ok(())
    }

    /// Returns every stored task.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when lock acquisition fails.
    pub fn all(&self) -> TaskRepositoryResult<Vec<ProcessingTask>> {
        Ok(self.read()?.tasks.values().cloned().collect())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Builds the stored task for a status write: everything from `incoming`
/// except progress, which keeps the stored value.
fn merge_status_write(stored: &ProcessingTask, incoming: &ProcessingTask) -> ProcessingTask {
    ProcessingTask::from_persisted(PersistedTaskData {
        id: incoming.id(),
        owner: incoming.owner(),
        kind: incoming.kind(),
        status: incoming.status(),
        config: *incoming.config(),
        progress: stored.progress().clone(),
        result: incoming.result().cloned(),
        digest_requested_at: incoming.digest_requested_at(),
        created_at: incoming.created_at(),
        updated_at: incoming.updated_at(),
        completed_at: incoming.completed_at(),
    })
}

#[async_trait]
impl ProcessingTaskRepository for InMemoryProcessingTaskRepository {
    async fn store(&self, task: &ProcessingTask) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if let Some(existing) = state.active_for_owner(task.owner()) {
            return Err(TaskRepositoryError::ActiveTaskExists {
                owner: task.owner(),
                task_id: existing.id(),
                status: existing.status(),
            });
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProcessingTask>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn find_active_for_owner(
        &self,
        owner: OwnerId,
    ) -> TaskRepositoryResult<Option<ProcessingTask>> {
        Ok(self.read()?.active_for_owner(owner).cloned())
    }

    async fn find_awaiting_digest(&self) -> TaskRepositoryResult<Vec<PollableTask>> {
        let state = self.read()?;
        let mut tasks: Vec<ProcessingTask> = state
            .tasks
            .values()
            .filter(|task| task.awaits_digest())
            .cloned()
            .collect();
        tasks.sort_by_key(ProcessingTask::created_at);
        Ok(tasks.into_iter().map(Ok).collect())
    }

    async fn update_if_status(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        if stored.status() != expected {
            return Ok(false);
        }
        let merged = merge_status_write(stored, task);
        state.tasks.insert(task.id(), merged);
        Ok(true)
    }

    async fn claim_digest_trigger(
        &self,
        id: TaskId,
        claimed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        if !stored.can_claim_digest() {
            return Ok(false);
        }
        stored.mark_digest_requested(claimed_at)?;
        Ok(true)
    }

    async fn record_progress(
        &self,
        id: TaskId,
        update: ProgressUpdate,
        recorded_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProcessingTask> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        stored.record_progress(update, recorded_at)?;
        Ok(stored.clone())
    }
}

//! `PostgreSQL` repository implementation for processing task storage.

use super::{
    blocking::{BlockingError, ProcessingPgPool, run_blocking},
    models::{NewProcessingTaskRow, ProcessingTaskRow, TaskStatusChangeset},
    schema::processing_tasks,
};
use crate::processing::{
    domain::{
        OwnerId, PersistedTaskData, ProcessingTask, ProgressUpdate, TaskId, TaskKind, TaskStatus,
    },
    ports::{
        PollableTask, ProcessingTaskRepository, TaskRepositoryError, TaskRepositoryResult,
        UnreadableTask,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

const OWNER_ACTIVE_INDEX: &str = "idx_processing_tasks_owner_active";

/// `PostgreSQL`-backed processing task repository.
#[derive(Debug, Clone)]
pub struct PostgresProcessingTaskRepository {
    pool: ProcessingPgPool,
}

impl PostgresProcessingTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProcessingPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, blocking_error, f).await
    }
}

fn blocking_error(err: BlockingError) -> TaskRepositoryError {
    TaskRepositoryError::persistence(err)
}

#[async_trait]
impl ProcessingTaskRepository for PostgresProcessingTaskRepository {
    async fn store(&self, task: &ProcessingTask) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let owner = task.owner();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            // The partial unique index is authoritative; this lookup only
            // names the conflicting task for the common case.
            if let Some(existing) = find_active_row(connection, owner)? {
                return Err(active_task_exists(owner, &existing));
            }

            let inserted = diesel::insert_into(processing_tasks::table)
                .values(&new_row)
                .execute(connection);
            match inserted {
                Ok(_) => Ok(()),
                Err(err) => Err(map_insert_error(connection, err, owner, task_id)),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<ProcessingTask>> {
        self.run_blocking(move |connection| {
            let row = processing_tasks::table
                .filter(processing_tasks::id.eq(id.into_inner()))
                .select(ProcessingTaskRow::as_select())
                .first::<ProcessingTaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_active_for_owner(
        &self,
        owner: OwnerId,
    ) -> TaskRepositoryResult<Option<ProcessingTask>> {
        self.run_blocking(move |connection| {
            find_active_row(connection, owner)?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn find_awaiting_digest(&self) -> TaskRepositoryResult<Vec<PollableTask>> {
        self.run_blocking(|connection| {
            let rows = processing_tasks::table
                .filter(processing_tasks::status.eq_any(active_labels()))
                .filter(processing_tasks::digest_requested_at.is_null())
                .order(processing_tasks::created_at.asc())
                .select(ProcessingTaskRow::as_select())
                .load::<ProcessingTaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(decode_pollable(rows))
        })
        .await
    }

    async fn update_if_status(
        &self,
        task: &ProcessingTask,
        expected: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        let task_id = task.id();
        let changeset = to_status_changeset(task)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                processing_tasks::table
                    .filter(processing_tasks::id.eq(task_id.into_inner()))
                    .filter(processing_tasks::status.eq(expected.as_str())),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;

            if updated > 0 {
                return Ok(true);
            }
            ensure_exists(connection, task_id)?;
            Ok(false)
        })
        .await
    }

    async fn claim_digest_trigger(
        &self,
        id: TaskId,
        claimed_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let claimed = diesel::update(
                processing_tasks::table
                    .filter(processing_tasks::id.eq(id.into_inner()))
                    .filter(processing_tasks::status.eq(TaskStatus::Running.as_str()))
                    .filter(processing_tasks::digest_requested_at.is_null()),
            )
            .set((
                processing_tasks::digest_requested_at.eq(Some(claimed_at)),
                processing_tasks::updated_at.eq(claimed_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;

            if claimed > 0 {
                return Ok(true);
            }
            ensure_exists(connection, id)?;
            Ok(false)
        })
        .await
    }

    async fn record_progress(
        &self,
        id: TaskId,
        update: ProgressUpdate,
        recorded_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProcessingTask> {
        self.run_blocking(move |connection| {
            connection
                .transaction::<_, ProgressTxError, _>(|tx| {
                    apply_progress(tx, id, update, recorded_at)
                })
                .map_err(ProgressTxError::into_repository_error)
        })
        .await
    }
}

/// Error type for the progress transaction; Diesel requires
/// `From<diesel::result::Error>` on the closure's error.
#[derive(Debug)]
enum ProgressTxError {
    Diesel(DieselError),
    Repository(TaskRepositoryError),
}

impl From<DieselError> for ProgressTxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<TaskRepositoryError> for ProgressTxError {
    fn from(err: TaskRepositoryError) -> Self {
        Self::Repository(err)
    }
}

impl ProgressTxError {
    fn into_repository_error(self) -> TaskRepositoryError {
        match self {
            Self::Diesel(err) => TaskRepositoryError::persistence(err),
            Self::Repository(err) => err,
        }
    }
}

fn apply_progress(
    connection: &mut PgConnection,
    id: TaskId,
    update: ProgressUpdate,
    recorded_at: DateTime<Utc>,
) -> Result<ProcessingTask, ProgressTxError> {
    let row = processing_tasks::table
        .filter(processing_tasks::id.eq(id.into_inner()))
        .select(ProcessingTaskRow::as_select())
        .for_update()
        .first::<ProcessingTaskRow>(connection)
        .optional()?
        .ok_or(TaskRepositoryError::NotFound(id))?;

    let mut task = row_to_task(row)?;
    let changed = task
        .record_progress(update, recorded_at)
        .map_err(TaskRepositoryError::from)?;
    if !changed {
        return Ok(task);
    }

    let progress =
        serde_json::to_value(task.progress()).map_err(TaskRepositoryError::persistence)?;
    diesel::update(processing_tasks::table.filter(processing_tasks::id.eq(id.into_inner())))
        .set((
            processing_tasks::progress.eq(progress),
            processing_tasks::updated_at.eq(task.updated_at()),
        ))
        .execute(connection)?;
    Ok(task)
}

fn active_labels() -> Vec<&'static str> {
    TaskStatus::ACTIVE
        .into_iter()
        .map(TaskStatus::as_str)
        .collect()
}

/// Decodes each row on its own so one bad record does not hide the others.
pub(super) fn decode_pollable(rows: Vec<ProcessingTaskRow>) -> Vec<PollableTask> {
    rows.into_iter()
        .map(|row| {
            let task_id = TaskId::from_uuid(row.id);
            row_to_task(row).map_err(|error| UnreadableTask { task_id, error })
        })
        .collect()
}

fn find_active_row(
    connection: &mut PgConnection,
    owner: OwnerId,
) -> TaskRepositoryResult<Option<ProcessingTaskRow>> {
    processing_tasks::table
        .filter(processing_tasks::owner_id.eq(owner.into_inner()))
        .filter(processing_tasks::status.eq_any(active_labels()))
        .order(processing_tasks::created_at.desc())
        .select(ProcessingTaskRow::as_select())
        .first::<ProcessingTaskRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

fn ensure_exists(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<()> {
    let exists = diesel::select(diesel::dsl::exists(
        processing_tasks::table.filter(processing_tasks::id.eq(id.into_inner())),
    ))
    .get_result::<bool>(connection)
    .map_err(TaskRepositoryError::persistence)?;
    if exists {
        Ok(())
    } else {
        Err(TaskRepositoryError::NotFound(id))
    }
}

fn map_insert_error(
    connection: &mut PgConnection,
    err: DieselError,
    owner: OwnerId,
    task_id: TaskId,
) -> TaskRepositoryError {
    let owner_conflict = matches!(
        &err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if is_owner_active_violation(info.as_ref())
    );
    if owner_conflict {
        return match find_active_row(connection, owner) {
            Ok(Some(existing)) => active_task_exists(owner, &existing),
            Ok(None) => TaskRepositoryError::persistence(err),
            Err(lookup_err) => lookup_err,
        };
    }
    if matches!(
        &err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ) {
        return TaskRepositoryError::DuplicateTask(task_id);
    }
    TaskRepositoryError::persistence(err)
}

fn is_owner_active_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == OWNER_ACTIVE_INDEX)
}

fn active_task_exists(owner: OwnerId, row: &ProcessingTaskRow) -> TaskRepositoryError {
    match TaskStatus::try_from(row.status.as_str()) {
        Ok(status) => TaskRepositoryError::ActiveTaskExists {
            owner,
            task_id: TaskId::from_uuid(row.id),
            status,
        },
        Err(err) => TaskRepositoryError::persistence(err),
    }
}

pub(super) fn to_new_row(task: &ProcessingTask) -> TaskRepositoryResult<NewProcessingTaskRow> {
    Ok(NewProcessingTaskRow {
        id: task.id().into_inner(),
        owner_id: task.owner().into_inner(),
        task_type: task.kind().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        config: serde_json::to_value(task.config()).map_err(TaskRepositoryError::persistence)?,
        progress: serde_json::to_value(task.progress())
            .map_err(TaskRepositoryError::persistence)?,
        result: result_to_json(task)?,
        digest_requested_at: task.digest_requested_at(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        completed_at: task.completed_at(),
    })
}

fn to_status_changeset(task: &ProcessingTask) -> TaskRepositoryResult<TaskStatusChangeset> {
    Ok(TaskStatusChangeset {
        status: task.status().as_str().to_owned(),
        result: result_to_json(task)?,
        digest_requested_at: task.digest_requested_at(),
        updated_at: task.updated_at(),
        completed_at: task.completed_at(),
    })
}

fn result_to_json(task: &ProcessingTask) -> TaskRepositoryResult<Option<serde_json::Value>> {
    task.result()
        .map(serde_json::to_value)
        .transpose()
        .map_err(TaskRepositoryError::persistence)
}

pub(super) fn row_to_task(row: ProcessingTaskRow) -> TaskRepositoryResult<ProcessingTask> {
    let ProcessingTaskRow {
        id,
        owner_id,
        task_type,
        status,
        config,
        progress,
        result,
        digest_requested_at,
        created_at,
        updated_at,
        completed_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        owner: OwnerId::from_uuid(owner_id),
        kind: TaskKind::try_from(task_type.as_str()).map_err(TaskRepositoryError::persistence)?,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?,
        config: serde_json::from_value(config).map_err(TaskRepositoryError::persistence)?,
        progress: serde_json::from_value(progress).map_err(TaskRepositoryError::persistence)?,
        result: result
            .map(serde_json::from_value)
            .transpose()
            .map_err(TaskRepositoryError::persistence)?,
        digest_requested_at,
        created_at,
        updated_at,
        completed_at,
    };
    Ok(ProcessingTask::from_persisted(data))
}

//! Runs Diesel calls on the blocking thread pool.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;
use tokio::task::JoinError;

/// `PostgreSQL` connection pool type used by processing adapters.
pub type ProcessingPgPool = Pool<ConnectionManager<PgConnection>>;

/// Failure to obtain a connection or to join the blocking task.
#[derive(Debug, Error)]
pub enum BlockingError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] JoinError),
}

/// Checks out a connection and runs `f` on `spawn_blocking`.
pub(super) async fn run_blocking<F, T, E>(
    pool: &ProcessingPgPool,
    to_error: fn(BlockingError) -> E,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let shared_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = shared_pool
            .get()
            .map_err(|err| to_error(BlockingError::Pool(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| to_error(BlockingError::Join(err)))?
}

//! `PostgreSQL` adapters for processing task persistence and collaborators.

mod blocking;
mod collaborators;
mod models;
mod repository;
mod schema;


pub use blocking::{BlockingError, ProcessingPgPool};
pub use collaborators::{
    PostgresActiveSourceCounter, PostgresCompletionCounts, PostgresDigestOutbox,
    PostgresUserPreferences,
};
pub use repository::PostgresProcessingTaskRepository;

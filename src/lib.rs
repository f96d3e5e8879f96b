//! Curator: orchestration core for content fetch, processing and digest
//! runs.
//!
//! A user-initiated processing task fans out into fetch and processing
//! sub-jobs owned by other subsystems. This crate decides when such a task
//! may start, tracks its status, detects when every sub-job has finished,
//! and triggers digest generation exactly once per task.
//!
//! # Architecture
//!
//! Curator follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the task store and collaborators
//! - **Adapters**: In-memory and `PostgreSQL` implementations of ports
//! - **Services**: Admission, completion polling and digest triggering
//!
//! # Modules
//!
//! - [`processing`]: Task lifecycle, completion detection and triggering
//! - [`config`]: Environment-driven settings
//! - [`telemetry`]: Tracing subscriber installation

pub mod config;
pub mod processing;
pub mod telemetry;

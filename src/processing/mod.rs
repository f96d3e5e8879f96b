//! Processing task orchestration.
//!
//! A processing task tracks one fetch → process → digest run for a user.
//! The module admits tasks one at a time per user, reclaims tasks that
//! outlived the staleness threshold, detects when every sub-job has
//! finished, and requests the digest at most once per task. It follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

//! Step definitions for completion polling scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

//! Step definitions for processing task admission scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

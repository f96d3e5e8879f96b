//! Adapter implementations for processing task ports.

pub mod memory;
pub mod postgres;

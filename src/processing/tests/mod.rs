//! Unit tests for processing task orchestration.

mod progress_tests;
mod support;

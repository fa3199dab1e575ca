//! Shared test utilities for worksheet-parsing integration tests.

pub mod builders;

pub use builders::*;

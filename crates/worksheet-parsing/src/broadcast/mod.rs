//! Shared state and change broadcasting for UI consumers.

pub mod state_store;

pub use state_store::{ParsingStore, StateChangeEvent};

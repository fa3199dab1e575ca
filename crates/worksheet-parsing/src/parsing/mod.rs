//! Multi-stream worksheet parsing state: types, actions, reducer and selectors.
//!
//! One stream per attachment. The reducer is the only thing that changes the
//! state; selectors only read it.

pub mod action;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod types;

pub use action::ParsingAction;
pub use reducer::{parsing_reducer, reduce, IgnoreReason, Reduction};
pub use selectors::{
    active_attachment_ids, get_active_parsing_count, get_streaming_state, get_streaming_status,
    has_active_parse, is_any_parsing_active, is_parsing_attachment, last_error, last_result,
    last_stats,
};
pub use state::ParsingContextState;
pub use types::{CompletedProblem, ParseFailure, StreamType, StreamingState, StreamingStatus};

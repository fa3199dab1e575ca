//! The parsing state machine.
//!
//! Pure: no I/O, no clocks. Every call builds a new [`ParsingContextState`]
//! and leaves the input untouched.

use std::sync::Arc;

use super::action::ParsingAction;
use super::state::ParsingContextState;
use super::types::{ParseFailure, StreamingState, StreamingStatus};

pub const THINKING_MESSAGE: &str = "AI is thinking...";
pub const GENERATING_MESSAGE: &str = "Generating results...";

/// Why an action left the state as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A `STREAM_*` action for an attachment with no active stream.
    NoActiveStream,
    /// A cancel with nothing to cancel.
    NothingToCancel,
    /// An action type this reducer does not handle.
    UnknownAction,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::NoActiveStream => write!(f, "no active stream"),
            IgnoreReason::NothingToCancel => write!(f, "nothing to cancel"),
            IgnoreReason::UnknownAction => write!(f, "unknown action"),
        }
    }
}

/// Outcome of reducing one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    Applied(ParsingContextState),
    Ignored(IgnoreReason),
}

impl Reduction {
    /// The next state, falling back to `previous` when ignored.
    pub fn into_state(self, previous: &ParsingContextState) -> ParsingContextState {
        match self {
            Reduction::Applied(state) => state,
            Reduction::Ignored(_) => previous.clone(),
        }
    }
}

/// `(state, action) -> state`.
///
/// Ignored actions return a clone sharing every map with `state`.
pub fn parsing_reducer(state: &ParsingContextState, action: &ParsingAction) -> ParsingContextState {
    reduce(state, action).into_state(state)
}

/// Reduces one action, reporting whether it changed anything.
pub fn reduce(state: &ParsingContextState, action: &ParsingAction) -> Reduction {
    match action {
        ParsingAction::StartStreaming {
            attachment_id,
            stream_type,
            total_problems,
        } => {
            let mut active = (*state.active_streams).clone();
            active.insert(
                attachment_id.clone(),
                Arc::new(StreamingState::connecting(*stream_type, *total_problems)),
            );
            let mut next = state.with_active_streams(active);

            if state.last_errors.contains_key(attachment_id) {
                let mut errors = (*state.last_errors).clone();
                errors.remove(attachment_id);
                next.last_errors = Arc::new(errors);
            }

            Reduction::Applied(next)
        }

        ParsingAction::StreamReasoning {
            attachment_id,
            text,
            append,
        } => update_stream(state, attachment_id, |stream| {
            if *append {
                stream.reasoning_text.push_str(text);
            } else {
                stream.reasoning_text = text.clone();
            }
            // Reparse narrates its own progress.
            if !stream.is_reparse() {
                stream.status = StreamingStatus::Reasoning;
                stream.progress_message = Some(THINKING_MESSAGE.to_string());
            }
        }),

        ParsingAction::StreamOutput {
            attachment_id,
            text,
        } => update_stream(state, attachment_id, |stream| {
            stream.output_text.push_str(text);
            stream.status = StreamingStatus::Generating;
            stream.progress_message = Some(output_progress_message(stream.completed_problems.len()));
        }),

        ParsingAction::StreamProblemComplete {
            attachment_id,
            problem,
            problem_index,
        } => update_stream(state, attachment_id, |stream| {
            stream.completed_problems.push(*problem);
            if let (Some(index), Some(indices)) = (problem_index, stream.completed_indices.as_mut()) {
                indices.push(*index);
            }
        }),

        ParsingAction::StreamReparseProgress {
            attachment_id,
            current,
            total,
        } => update_stream(state, attachment_id, |stream| {
            stream.status = StreamingStatus::Processing;
            stream.current_problem_index = Some(*current);
            stream.total_problems = Some(*total);
            stream.progress_message = Some(reparse_progress_message(*current, *total));
        }),

        ParsingAction::StreamProgressMessage {
            attachment_id,
            message,
        } => update_stream(state, attachment_id, |stream| {
            stream.progress_message = Some(message.clone());
        }),

        ParsingAction::ParseComplete {
            attachment_id,
            result,
            stats,
        } => {
            let mut next = without_stream(state, attachment_id);
            if let Some(result) = result {
                let mut results = (*state.last_results).clone();
                results.insert(attachment_id.clone(), Arc::clone(result));
                next.last_results = Arc::new(results);
            }
            if let Some(stats) = stats {
                let mut all_stats = (*state.last_stats).clone();
                all_stats.insert(attachment_id.clone(), stats.clone());
                next.last_stats = Arc::new(all_stats);
            }
            Reduction::Applied(next)
        }

        ParsingAction::ParseFailed {
            attachment_id,
            error,
            code,
        } => {
            let mut next = without_stream(state, attachment_id);
            let mut errors = (*state.last_errors).clone();
            errors.insert(
                attachment_id.clone(),
                ParseFailure {
                    message: error.clone(),
                    code: code.clone(),
                },
            );
            next.last_errors = Arc::new(errors);
            Reduction::Applied(next)
        }

        ParsingAction::Cancel { attachment_id } => {
            if !state.active_streams.contains_key(attachment_id) {
                return Reduction::Ignored(IgnoreReason::NothingToCancel);
            }
            Reduction::Applied(without_stream(state, attachment_id))
        }

        ParsingAction::CancelAll => {
            if state.active_streams.is_empty() {
                return Reduction::Ignored(IgnoreReason::NothingToCancel);
            }
            Reduction::Applied(state.with_active_streams(Default::default()))
        }

        ParsingAction::Reset => Reduction::Applied(ParsingContextState::initial()),

        ParsingAction::Unknown => Reduction::Ignored(IgnoreReason::UnknownAction),
    }
}

/// Applies `f` to a copy of the attachment's stream, if it has one.
fn update_stream<F>(state: &ParsingContextState, attachment_id: &str, f: F) -> Reduction
where
    F: FnOnce(&mut StreamingState),
{
    let Some(current) = state.active_streams.get(attachment_id) else {
        return Reduction::Ignored(IgnoreReason::NoActiveStream);
    };

    let mut stream = StreamingState::clone(current);
    f(&mut stream);

    let mut active = (*state.active_streams).clone();
    active.insert(attachment_id.to_string(), Arc::new(stream));
    Reduction::Applied(state.with_active_streams(active))
}

fn without_stream(state: &ParsingContextState, attachment_id: &str) -> ParsingContextState {
    let mut active = (*state.active_streams).clone();
    active.remove(attachment_id);
    state.with_active_streams(active)
}

fn output_progress_message(found: usize) -> String {
    if found > 0 {
        format!("Extracting problems... {} found", found)
    } else {
        GENERATING_MESSAGE.to_string()
    }
}

/// `current` is 0-based; the message is 1-based.
fn reparse_progress_message(current: usize, total: usize) -> String {
    format!("Analyzing problem {} of {}...", current + 1, total)
}

//! Read-only queries over [`ParsingContextState`].

use super::state::ParsingContextState;
use super::types::{ParseFailure, StreamingState, StreamingStatus};
use crate::schema::{ParsingStats, WorksheetParsingResult};

pub fn is_parsing_attachment(state: &ParsingContextState, attachment_id: &str) -> bool {
    state.active_streams.contains_key(attachment_id)
}

pub fn is_any_parsing_active(state: &ParsingContextState) -> bool {
    !state.active_streams.is_empty()
}

pub fn get_streaming_status(
    state: &ParsingContextState,
    attachment_id: &str,
) -> Option<StreamingStatus> {
    state.active_streams.get(attachment_id).map(|s| s.status)
}

pub fn get_streaming_state<'a>(
    state: &'a ParsingContextState,
    attachment_id: &str,
) -> Option<&'a StreamingState> {
    state.active_streams.get(attachment_id).map(|s| s.as_ref())
}

pub fn get_active_parsing_count(state: &ParsingContextState) -> usize {
    state.active_streams.len()
}

/// Like [`is_parsing_attachment`], but also checks the status is non-terminal.
pub fn has_active_parse(state: &ParsingContextState, attachment_id: &str) -> bool {
    get_streaming_status(state, attachment_id).is_some_and(|status| !status.is_terminal())
}

/// Ids of attachments with a non-terminal stream, sorted.
pub fn active_attachment_ids(state: &ParsingContextState) -> Vec<&str> {
    let mut ids: Vec<&str> = state
        .active_streams
        .iter()
        .filter(|(_, stream)| !stream.status.is_terminal())
        .map(|(id, _)| id.as_str())
        .collect();
    ids.sort_unstable();
    ids
}

pub fn last_result<'a>(
    state: &'a ParsingContextState,
    attachment_id: &str,
) -> Option<&'a WorksheetParsingResult> {
    state.last_results.get(attachment_id).map(|r| r.as_ref())
}

pub fn last_stats<'a>(state: &'a ParsingContextState, attachment_id: &str) -> Option<&'a ParsingStats> {
    state.last_stats.get(attachment_id)
}

pub fn last_error<'a>(state: &'a ParsingContextState, attachment_id: &str) -> Option<&'a ParseFailure> {
    state.last_errors.get(attachment_id)
}

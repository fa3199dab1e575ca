//! Registry of active streams plus the last known outcome per attachment.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::types::{ParseFailure, StreamingState};
use crate::schema::{ParsingStats, WorksheetParsingResult};

pub type StreamMap = HashMap<String, Arc<StreamingState>>;
pub type ResultMap = HashMap<String, Arc<WorksheetParsingResult>>;
pub type StatsMap = HashMap<String, ParsingStats>;
pub type ErrorMap = HashMap<String, ParseFailure>;

/// Process-local parsing state. Never persisted.
///
/// Each map sits behind an `Arc`. A transition rebuilds only the map it
/// touches, so untouched maps (and untouched entries) are shared between the
/// previous and the next state. Equality is by value; use
/// [`ParsingContextState::ptr_eq`] for identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsingContextState {
    /// Only non-terminal streams live here.
    pub(crate) active_streams: Arc<StreamMap>,
    pub(crate) last_results: Arc<ResultMap>,
    pub(crate) last_stats: Arc<StatsMap>,
    pub(crate) last_errors: Arc<ErrorMap>,
}

impl ParsingContextState {
    /// The canonical empty state.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn active_streams(&self) -> &StreamMap {
        &self.active_streams
    }

    pub fn last_results(&self) -> &ResultMap {
        &self.last_results
    }

    pub fn last_stats(&self) -> &StatsMap {
        &self.last_stats
    }

    pub fn last_errors(&self) -> &ErrorMap {
        &self.last_errors
    }

    /// True when both states share every map, i.e. nothing changed between them.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.active_streams, &other.active_streams)
            && Arc::ptr_eq(&self.last_results, &other.last_results)
            && Arc::ptr_eq(&self.last_stats, &other.last_stats)
            && Arc::ptr_eq(&self.last_errors, &other.last_errors)
    }

    pub(crate) fn with_active_streams(&self, active_streams: StreamMap) -> Self {
        Self {
            active_streams: Arc::new(active_streams),
            ..self.clone()
        }
    }
}

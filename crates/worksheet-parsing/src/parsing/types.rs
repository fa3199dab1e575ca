//! Per-attachment streaming state.

use serde::{Deserialize, Serialize};

use crate::schema::BoundingBox;

/// Status of one parse stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamingStatus {
    Idle,
    Connecting,
    Reasoning,
    Processing,
    Generating,
    Complete,
    Error,
    Cancelled,
}

impl StreamingStatus {
    /// Terminal statuses never appear in the active registry.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StreamingStatus::Complete | StreamingStatus::Error | StreamingStatus::Cancelled
        )
    }
}

impl std::fmt::Display for StreamingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamingStatus::Idle => write!(f, "idle"),
            StreamingStatus::Connecting => write!(f, "connecting"),
            StreamingStatus::Reasoning => write!(f, "reasoning"),
            StreamingStatus::Processing => write!(f, "processing"),
            StreamingStatus::Generating => write!(f, "generating"),
            StreamingStatus::Complete => write!(f, "complete"),
            StreamingStatus::Error => write!(f, "error"),
            StreamingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Kind of parse operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// First parse of a whole worksheet.
    Initial,
    /// Re-analysis of a known set of flagged problems.
    Reparse,
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamType::Initial => write!(f, "initial"),
            StreamType::Reparse => write!(f, "reparse"),
        }
    }
}

/// A problem whose number and bounding box have fully streamed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedProblem {
    pub problem_number: u32,
    pub problem_bounding_box: BoundingBox,
}

/// Last failure recorded for an attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailure {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Live bookkeeping for one in-flight parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamingState {
    pub status: StreamingStatus,
    pub stream_type: StreamType,
    /// Model's visible reasoning so far.
    pub reasoning_text: String,
    /// Raw structured output so far.
    pub output_text: String,
    pub progress_message: Option<String>,
    /// In arrival order; never deduplicated.
    pub completed_problems: Vec<CompletedProblem>,
    /// Reparse only.
    pub current_problem_index: Option<usize>,
    pub total_problems: Option<usize>,
    /// Reparse only.
    pub completed_indices: Option<Vec<usize>>,
}

impl StreamingState {
    /// Fresh state for a stream that is connecting.
    pub fn connecting(stream_type: StreamType, total_problems: Option<usize>) -> Self {
        let (current_problem_index, completed_indices) = match stream_type {
            StreamType::Initial => (None, None),
            StreamType::Reparse => (Some(0), Some(Vec::new())),
        };

        Self {
            status: StreamingStatus::Connecting,
            stream_type,
            reasoning_text: String::new(),
            output_text: String::new(),
            progress_message: None,
            completed_problems: Vec::new(),
            current_problem_index,
            total_problems,
            completed_indices,
        }
    }

    pub fn is_reparse(&self) -> bool {
        self.stream_type == StreamType::Reparse
    }
}

//! Actions accepted by the parsing reducer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::{CompletedProblem, StreamType};
use crate::schema::{ParsingStats, WorksheetParsingResult};

/// Every transition of the parsing state goes through one of these.
///
/// Serialized with a `type` tag so action logs can be stored and replayed:
///
/// ```json
/// {"type": "STREAM_OUTPUT", "attachmentId": "a1", "text": "{\"problems\": ["}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ParsingAction {
    StartStreaming {
        attachment_id: String,
        stream_type: StreamType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_problems: Option<usize>,
    },
    StreamReasoning {
        attachment_id: String,
        text: String,
        #[serde(default)]
        append: bool,
    },
    StreamOutput {
        attachment_id: String,
        text: String,
    },
    StreamProblemComplete {
        attachment_id: String,
        problem: CompletedProblem,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        problem_index: Option<usize>,
    },
    StreamReparseProgress {
        attachment_id: String,
        current: usize,
        total: usize,
    },
    StreamProgressMessage {
        attachment_id: String,
        message: String,
    },
    ParseComplete {
        attachment_id: String,
        result: Option<Arc<WorksheetParsingResult>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stats: Option<ParsingStats>,
    },
    ParseFailed {
        attachment_id: String,
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    Cancel {
        attachment_id: String,
    },
    CancelAll,
    Reset,
    /// Any `type` this version does not know about.
    #[serde(other)]
    Unknown,
}

impl ParsingAction {
    pub fn start(attachment_id: &str, stream_type: StreamType, total_problems: Option<usize>) -> Self {
        ParsingAction::StartStreaming {
            attachment_id: attachment_id.to_string(),
            stream_type,
            total_problems,
        }
    }

    pub fn reasoning(attachment_id: &str, text: &str, append: bool) -> Self {
        ParsingAction::StreamReasoning {
            attachment_id: attachment_id.to_string(),
            text: text.to_string(),
            append,
        }
    }

    pub fn output(attachment_id: &str, text: &str) -> Self {
        ParsingAction::StreamOutput {
            attachment_id: attachment_id.to_string(),
            text: text.to_string(),
        }
    }

    pub fn failed(attachment_id: &str, error: &str, code: Option<&str>) -> Self {
        ParsingAction::ParseFailed {
            attachment_id: attachment_id.to_string(),
            error: error.to_string(),
            code: code.map(|c| c.to_string()),
        }
    }

    pub fn cancel(attachment_id: &str) -> Self {
        ParsingAction::Cancel {
            attachment_id: attachment_id.to_string(),
        }
    }

    /// The attachment this action addresses, if it addresses one.
    pub fn attachment_id(&self) -> Option<&str> {
        match self {
            ParsingAction::StartStreaming { attachment_id, .. }
            | ParsingAction::StreamReasoning { attachment_id, .. }
            | ParsingAction::StreamOutput { attachment_id, .. }
            | ParsingAction::StreamProblemComplete { attachment_id, .. }
            | ParsingAction::StreamReparseProgress { attachment_id, .. }
            | ParsingAction::StreamProgressMessage { attachment_id, .. }
            | ParsingAction::ParseComplete { attachment_id, .. }
            | ParsingAction::ParseFailed { attachment_id, .. }
            | ParsingAction::Cancel { attachment_id } => Some(attachment_id),
            ParsingAction::CancelAll | ParsingAction::Reset | ParsingAction::Unknown => None,
        }
    }

    /// Wire name of the action type.
    pub fn kind(&self) -> &'static str {
        match self {
            ParsingAction::StartStreaming { .. } => "START_STREAMING",
            ParsingAction::StreamReasoning { .. } => "STREAM_REASONING",
            ParsingAction::StreamOutput { .. } => "STREAM_OUTPUT",
            ParsingAction::StreamProblemComplete { .. } => "STREAM_PROBLEM_COMPLETE",
            ParsingAction::StreamReparseProgress { .. } => "STREAM_REPARSE_PROGRESS",
            ParsingAction::StreamProgressMessage { .. } => "STREAM_PROGRESS_MESSAGE",
            ParsingAction::ParseComplete { .. } => "PARSE_COMPLETE",
            ParsingAction::ParseFailed { .. } => "PARSE_FAILED",
            ParsingAction::Cancel { .. } => "CANCEL",
            ParsingAction::CancelAll => "CANCEL_ALL",
            ParsingAction::Reset => "RESET",
            ParsingAction::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_action() {
        let json = r#"{"type": "START_STREAMING", "attachmentId": "a1", "streamType": "reparse", "totalProblems": 3}"#;
        let action: ParsingAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, ParsingAction::start("a1", StreamType::Reparse, Some(3)));
        assert_eq!(action.kind(), "START_STREAMING");
    }

    #[test]
    fn test_reasoning_append_defaults_to_false() {
        let json = r#"{"type": "STREAM_REASONING", "attachmentId": "a1", "text": "hmm"}"#;
        let action: ParsingAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, ParsingAction::reasoning("a1", "hmm", false));
    }

    #[test]
    fn test_unknown_type_decodes_to_unknown() {
        let json = r#"{"type": "SOMETHING_NEW"}"#;
        let action: ParsingAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, ParsingAction::Unknown);
        assert_eq!(action.attachment_id(), None);
    }

    #[test]
    fn test_unit_actions_serialize_with_tag_only() {
        let json = serde_json::to_string(&ParsingAction::CancelAll).unwrap();
        assert_eq!(json, r#"{"type":"CANCEL_ALL"}"#);
    }

    #[test]
    fn test_attachment_id() {
        assert_eq!(ParsingAction::cancel("x").attachment_id(), Some("x"));
        assert_eq!(ParsingAction::Reset.attachment_id(), None);
    }
}

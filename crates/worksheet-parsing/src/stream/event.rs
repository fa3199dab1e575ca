//! Typed events sent by the parse endpoint, and their mapping onto actions.

use std::sync::Arc;

use serde::Deserialize;

use super::sse::SseFrame;
use crate::error::EventError;
use crate::parsing::{CompletedProblem, ParsingAction};
use crate::schema::{ParsingStats, WorksheetParsingResult};

/// Sentinel some providers send as the last `data:` payload.
const DONE_SENTINEL: &str = "[DONE]";

/// An event from the parse endpoint.
///
/// The SSE `event:` name selects the variant; a JSON `type` field is used
/// when the frame has no name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    Reasoning {
        text: String,
        #[serde(default)]
        append: bool,
    },
    OutputDelta {
        text: String,
    },
    ProblemComplete {
        problem: CompletedProblem,
        #[serde(default)]
        problem_index: Option<usize>,
    },
    ReparseProgress {
        current: usize,
        total: usize,
    },
    Progress {
        message: String,
    },
    Complete {
        #[serde(default)]
        result: Option<WorksheetParsingResult>,
        #[serde(default)]
        stats: Option<ParsingStats>,
    },
    Error {
        message: String,
        #[serde(default)]
        code: Option<String>,
    },
    Cancelled,
    /// Keep-alives, `started` acknowledgements and anything newer than us.
    #[serde(other)]
    Other,
}

impl StreamEvent {
    /// Decodes a frame. `Ok(None)` means the frame carries nothing to act on.
    pub fn from_frame(frame: &SseFrame) -> Result<Option<Self>, EventError> {
        let name = frame.event.as_deref().unwrap_or("message");
        let data = frame.data.trim();
        if data == DONE_SENTINEL {
            return Ok(None);
        }

        let mut value: serde_json::Value = if data.is_empty() {
            serde_json::Value::Object(Default::default())
        } else {
            serde_json::from_str(data).map_err(|source| EventError::InvalidJson {
                event: name.to_string(),
                source,
            })?
        };

        let Some(object) = value.as_object_mut() else {
            // A bare JSON scalar cannot carry an event.
            return Ok(None);
        };
        if !object.contains_key("type") {
            match &frame.event {
                Some(event) => {
                    object.insert("type".to_string(), serde_json::Value::String(event.clone()));
                }
                None => {
                    return Err(EventError::MissingField {
                        event: name.to_string(),
                        field: "type",
                    })
                }
            }
        }

        let event: StreamEvent =
            serde_json::from_value(value).map_err(|source| EventError::InvalidJson {
                event: name.to_string(),
                source,
            })?;

        match event {
            StreamEvent::Other => Ok(None),
            event => Ok(Some(event)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Complete { .. } | StreamEvent::Error { .. } | StreamEvent::Cancelled
        )
    }

    /// Maps the event onto the action for `attachment_id`.
    ///
    /// Completed results without stats get stats computed here.
    pub fn into_action(self, attachment_id: &str, low_confidence_threshold: f32) -> Option<ParsingAction> {
        let attachment_id = attachment_id.to_string();
        let action = match self {
            StreamEvent::Reasoning { text, append } => ParsingAction::StreamReasoning {
                attachment_id,
                text,
                append,
            },
            StreamEvent::OutputDelta { text } => ParsingAction::StreamOutput {
                attachment_id,
                text,
            },
            StreamEvent::ProblemComplete {
                problem,
                problem_index,
            } => ParsingAction::StreamProblemComplete {
                attachment_id,
                problem,
                problem_index,
            },
            StreamEvent::ReparseProgress { current, total } => {
                ParsingAction::StreamReparseProgress {
                    attachment_id,
                    current,
                    total,
                }
            }
            StreamEvent::Progress { message } => ParsingAction::StreamProgressMessage {
                attachment_id,
                message,
            },
            StreamEvent::Complete { result, stats } => {
                let stats = match (&result, stats) {
                    (_, Some(stats)) => Some(stats),
                    (Some(result), None) => {
                        Some(ParsingStats::from_result(result, low_confidence_threshold))
                    }
                    (None, None) => None,
                };
                ParsingAction::ParseComplete {
                    attachment_id,
                    result: result.map(Arc::new),
                    stats,
                }
            }
            StreamEvent::Error { message, code } => ParsingAction::ParseFailed {
                attachment_id,
                error: message,
                code,
            },
            StreamEvent::Cancelled => ParsingAction::Cancel { attachment_id },
            StreamEvent::Other => return None,
        };
        Some(action)
    }
}

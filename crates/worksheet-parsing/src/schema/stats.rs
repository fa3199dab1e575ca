//! Statistics derived from a completed parse.

use serde::{Deserialize, Serialize};

use super::result::WorksheetParsingResult;

/// Confidence below which a problem is flagged for review.
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Summary counts for one parsed worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsingStats {
    pub total_problems: usize,
    pub answered_problems: usize,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub unanswered_count: usize,
    pub low_confidence_count: usize,
    /// `None` when nothing was answered.
    pub accuracy: Option<f64>,
    pub needs_review: bool,
}

impl ParsingStats {
    /// Computes stats for a result.
    pub fn from_result(result: &WorksheetParsingResult, low_confidence_threshold: f32) -> Self {
        let total_problems = result.problems.len();
        let mut correct_count = 0;
        let mut incorrect_count = 0;
        let mut low_confidence_count = 0;

        for problem in &result.problems {
            match problem.is_correct() {
                Some(true) => correct_count += 1,
                Some(false) => incorrect_count += 1,
                None => {}
            }
            if problem.min_confidence() < low_confidence_threshold {
                low_confidence_count += 1;
            }
        }

        let answered_problems = correct_count + incorrect_count;
        let accuracy = if answered_problems > 0 {
            Some(correct_count as f64 / answered_problems as f64)
        } else {
            None
        };

        Self {
            total_problems,
            answered_problems,
            correct_count,
            incorrect_count,
            unanswered_count: total_problems - answered_problems,
            low_confidence_count,
            accuracy,
            needs_review: result.needs_review || low_confidence_count > 0,
        }
    }
}

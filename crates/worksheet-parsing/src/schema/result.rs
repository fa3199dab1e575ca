//! Structured output produced by a worksheet parse.

use serde::{Deserialize, Serialize};

/// Rectangle in normalized image coordinates (0.0 - 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Layout of a single problem on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemFormat {
    /// Terms stacked in a column with the answer below.
    Vertical,
    /// Terms written left to right, e.g. `45 + 27 =`.
    Linear,
}

/// One problem extracted from the worksheet image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedProblem {
    /// Number printed next to the problem.
    pub problem_number: u32,
    /// Grid row (1-based).
    pub row: u32,
    /// Grid column (1-based).
    pub column: u32,
    pub format: ProblemFormat,
    /// Signed terms; subtraction is a negative term.
    pub terms: Vec<i64>,
    pub correct_answer: i64,
    /// What the student wrote, if anything legible.
    #[serde(default)]
    pub student_answer: Option<i64>,
    #[serde(default = "default_confidence")]
    pub student_answer_confidence: f32,
    #[serde(default = "default_confidence")]
    pub terms_confidence: f32,
    pub problem_bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_bounding_box: Option<BoundingBox>,
}

fn default_confidence() -> f32 {
    1.0
}

impl ParsedProblem {
    /// Returns `None` for unanswered problems.
    pub fn is_correct(&self) -> Option<bool> {
        self.student_answer
            .map(|answer| answer == self.correct_answer)
    }

    /// Lowest confidence across the terms and the student answer.
    pub fn min_confidence(&self) -> f32 {
        self.student_answer_confidence.min(self.terms_confidence)
    }
}

/// Page-level information detected alongside the problems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub detected_format: ProblemFormat,
    #[serde(default)]
    pub total_rows: u32,
    #[serde(default)]
    pub problems_per_row: u32,
}

/// Complete result of parsing one worksheet image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetParsingResult {
    pub problems: Vec<ParsedProblem>,
    pub page_metadata: PageMetadata,
    #[serde(default = "default_confidence")]
    pub overall_confidence: f32,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub needs_review: bool,
}

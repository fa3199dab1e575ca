//! Builders for parse results and action sequences.

#![allow(dead_code)]

use std::sync::Arc;

use worksheet_parsing::parsing::{CompletedProblem, ParsingAction, StreamType};
use worksheet_parsing::schema::{
    BoundingBox, PageMetadata, ParsedProblem, ParsingStats, ProblemFormat, WorksheetParsingResult,
};

/// Builder for `ParsedProblem` instances.
pub struct ProblemBuilder {
    problem: ParsedProblem,
}

impl ProblemBuilder {
    pub fn new(problem_number: u32) -> Self {
        Self {
            problem: ParsedProblem {
                problem_number,
                row: 1,
                column: problem_number,
                format: ProblemFormat::Vertical,
                terms: vec![25, 17],
                correct_answer: 42,
                student_answer: None,
                student_answer_confidence: 0.95,
                terms_confidence: 0.95,
                problem_bounding_box: BoundingBox::new(0.1 * problem_number as f64, 0.1, 0.08, 0.2),
                answer_bounding_box: None,
            },
        }
    }

    pub fn terms(mut self, terms: &[i64]) -> Self {
        self.problem.correct_answer = terms.iter().sum();
        self.problem.terms = terms.to_vec();
        self
    }

    pub fn answered(mut self, answer: i64) -> Self {
        self.problem.student_answer = Some(answer);
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.problem.student_answer_confidence = confidence;
        self
    }

    pub fn build(self) -> ParsedProblem {
        self.problem
    }
}

/// Builder for `WorksheetParsingResult` instances.
pub struct ResultBuilder {
    problems: Vec<ParsedProblem>,
    needs_review: bool,
    warnings: Vec<String>,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self {
            problems: vec![],
            needs_review: false,
            warnings: vec![],
        }
    }

    pub fn problem(mut self, problem: ParsedProblem) -> Self {
        self.problems.push(problem);
        self
    }

    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    pub fn needs_review(mut self) -> Self {
        self.needs_review = true;
        self
    }

    pub fn build(self) -> WorksheetParsingResult {
        WorksheetParsingResult {
            page_metadata: PageMetadata {
                lesson_id: Some("lesson-3".to_string()),
                week_id: None,
                page_number: Some(1),
                detected_format: ProblemFormat::Vertical,
                total_rows: 1,
                problems_per_row: self.problems.len() as u32,
            },
            problems: self.problems,
            overall_confidence: 0.9,
            warnings: self.warnings,
            needs_review: self.needs_review,
        }
    }
}

pub fn completed(problem_number: u32) -> CompletedProblem {
    CompletedProblem {
        problem_number,
        problem_bounding_box: BoundingBox::new(0.1, 0.2, 0.1, 0.1),
    }
}

pub fn start(id: &str, stream_type: StreamType, total: Option<usize>) -> ParsingAction {
    ParsingAction::start(id, stream_type, total)
}

pub fn complete(id: &str, result: Option<WorksheetParsingResult>, stats: Option<ParsingStats>) -> ParsingAction {
    ParsingAction::ParseComplete {
        attachment_id: id.to_string(),
        result: result.map(Arc::new),
        stats,
    }
}

pub fn problem_complete(id: &str, problem_number: u32, index: Option<usize>) -> ParsingAction {
    ParsingAction::StreamProblemComplete {
        attachment_id: id.to_string(),
        problem: completed(problem_number),
        problem_index: index,
    }
}

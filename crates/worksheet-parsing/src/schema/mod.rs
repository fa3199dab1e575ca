//! Payload types for parse results and their derived statistics.

pub mod result;
pub mod stats;

pub use result::{BoundingBox, PageMetadata, ParsedProblem, ProblemFormat, WorksheetParsingResult};
pub use stats::{ParsingStats, DEFAULT_LOW_CONFIDENCE_THRESHOLD};

//! Detects completed problem objects in a partial JSON output stream.
//!
//! The model streams a JSON document shaped like
//! `{"problems": [{...}, {...}], "pageMetadata": {...}}`. Long before the
//! document is valid JSON, each element of the `problems` array closes one at
//! a time; [`ProblemExtractor`] reports each one as soon as it does.

use log::warn;
use serde::Deserialize;

use crate::parsing::CompletedProblem;
use crate::schema::BoundingBox;

const PROBLEMS_KEY: &str = "\"problems\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Looking for the `"problems"` key and its opening bracket.
    SeekingArray,
    InArray,
    /// The array closed; nothing more to find.
    Done,
}

/// Only the fields needed for progressive highlighting.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProblemHeader {
    problem_number: u32,
    problem_bounding_box: BoundingBox,
}

#[derive(Debug)]
pub struct ProblemExtractor {
    buffer: String,
    /// Byte offset where scanning resumes.
    pos: usize,
    phase: Phase,
    depth: u32,
    in_string: bool,
    escape_next: bool,
    object_start: Option<usize>,
    found: usize,
}

impl Default for ProblemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemExtractor {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            pos: 0,
            phase: Phase::SeekingArray,
            depth: 0,
            in_string: false,
            escape_next: false,
            object_start: None,
            found: 0,
        }
    }

    /// Number of problems reported so far.
    pub fn found(&self) -> usize {
        self.found
    }

    /// Appends output text and returns the problems it completed.
    pub fn push(&mut self, text: &str) -> Vec<CompletedProblem> {
        if self.phase == Phase::Done {
            return Vec::new();
        }
        self.buffer.push_str(text);

        let mut completed = Vec::new();
        loop {
            match self.phase {
                Phase::SeekingArray => {
                    if !self.seek_array() {
                        break;
                    }
                }
                Phase::InArray => {
                    self.scan_array(&mut completed);
                    break;
                }
                Phase::Done => break,
            }
        }

        if self.phase == Phase::Done {
            self.buffer = String::new();
            self.pos = 0;
        }
        completed
    }

    /// Advances past `"problems"` and `[`. Returns false if more input is needed.
    fn seek_array(&mut self) -> bool {
        let Some(key) = self.buffer[self.pos..].find(PROBLEMS_KEY) else {
            // Keep a tail in case the key is split across chunks.
            self.pos = floor_char_boundary(
                &self.buffer,
                self.buffer.len().saturating_sub(PROBLEMS_KEY.len()),
            )
            .max(self.pos);
            return false;
        };
        let after_key = self.pos + key + PROBLEMS_KEY.len();

        let rest = &self.buffer[after_key..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':');
        if trimmed.is_empty() {
            self.pos = self.pos + key;
            return false;
        }
        if !trimmed.starts_with('[') {
            // A "problems" string that is not the array key.
            self.pos = after_key;
            return true;
        }

        let bracket = after_key + (rest.len() - trimmed.len());
        self.pos = bracket + 1;
        self.phase = Phase::InArray;
        true
    }

    fn scan_array(&mut self, completed: &mut Vec<CompletedProblem>) {
        let start = self.pos;
        let mut closed_objects = Vec::new();

        for (offset, c) in self.buffer[start..].char_indices() {
            let index = start + offset;
            if self.escape_next {
                self.escape_next = false;
                continue;
            }

            match c {
                '\\' if self.in_string => self.escape_next = true,
                '"' => self.in_string = !self.in_string,
                '{' if !self.in_string => {
                    if self.depth == 0 {
                        self.object_start = Some(index);
                    }
                    self.depth += 1;
                }
                '}' if !self.in_string && self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        if let Some(object_start) = self.object_start.take() {
                            closed_objects.push((object_start, index + 1));
                        }
                    }
                }
                ']' if !self.in_string && self.depth == 0 => {
                    self.phase = Phase::Done;
                    self.pos = index + 1;
                    break;
                }
                _ => {}
            }
        }

        if self.phase == Phase::InArray {
            self.pos = self.buffer.len();
        }

        for (begin, end) in closed_objects {
            match serde_json::from_str::<ProblemHeader>(&self.buffer[begin..end]) {
                Ok(header) => {
                    self.found += 1;
                    completed.push(CompletedProblem {
                        problem_number: header.problem_number,
                        problem_bounding_box: header.problem_bounding_box,
                    });
                }
                Err(e) => {
                    warn!("Skipping streamed problem that failed to decode: {}", e);
                }
            }
        }
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

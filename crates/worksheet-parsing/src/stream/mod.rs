//! Server-sent-event plumbing between the parse endpoint and the reducer.

pub mod event;
pub mod problems;
pub mod sse;

pub use event::StreamEvent;
pub use problems::ProblemExtractor;
pub use sse::{SseDecoder, SseFrame};

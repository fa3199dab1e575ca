//! End-to-end reducer scenarios driven by action sequences.

mod common;

use common::*;
use worksheet_parsing::parsing::{
    get_active_parsing_count, get_streaming_state, get_streaming_status, is_any_parsing_active,
    is_parsing_attachment, last_error, last_result, last_stats, parsing_reducer, ParsingAction,
    ParsingContextState, StreamType, StreamingStatus,
};
use worksheet_parsing::schema::{ParsingStats, DEFAULT_LOW_CONFIDENCE_THRESHOLD};

fn run(actions: &[ParsingAction]) -> ParsingContextState {
    actions
        .iter()
        .fold(ParsingContextState::initial(), |state, action| parsing_reducer(&state, action))
}

#[test]
fn initial_parse_happy_path() {
    let result = ResultBuilder::new()
        .problem(ProblemBuilder::new(1).terms(&[12, 30]).answered(42).build())
        .build();
    let stats = ParsingStats::from_result(&result, DEFAULT_LOW_CONFIDENCE_THRESHOLD);

    let state = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::reasoning("a1", "thinking", false),
        ParsingAction::output("a1", r#"{"x":1}"#),
        complete("a1", Some(result.clone()), Some(stats)),
    ]);

    assert!(!is_parsing_attachment(&state, "a1"));
    assert_eq!(last_result(&state, "a1"), Some(&result));
    assert_eq!(last_stats(&state, "a1").map(|s| s.total_problems), Some(1));
    assert_eq!(last_stats(&state, "a1").and_then(|s| s.accuracy), Some(1.0));
    assert!(!is_any_parsing_active(&state));
}

#[test]
fn intermediate_states_of_initial_parse() {
    let mut state = run(&[start("a1", StreamType::Initial, None)]);
    assert_eq!(get_streaming_status(&state, "a1"), Some(StreamingStatus::Connecting));

    state = parsing_reducer(&state, &ParsingAction::reasoning("a1", "thinking", false));
    assert_eq!(get_streaming_status(&state, "a1"), Some(StreamingStatus::Reasoning));

    state = parsing_reducer(&state, &problem_complete("a1", 1, None));
    state = parsing_reducer(&state, &problem_complete("a1", 2, None));
    state = parsing_reducer(&state, &ParsingAction::output("a1", "..."));

    let stream = get_streaming_state(&state, "a1").unwrap();
    assert_eq!(stream.status, StreamingStatus::Generating);
    assert_eq!(stream.progress_message.as_deref(), Some("Extracting problems... 2 found"));
    assert_eq!(stream.completed_problems.len(), 2);
}

#[test]
fn reparse_tracks_completed_indices() {
    let state = run(&[
        start("a1", StreamType::Reparse, Some(3)),
        problem_complete("a1", 14, Some(1)),
    ]);

    let stream = get_streaming_state(&state, "a1").unwrap();
    assert_eq!(stream.completed_indices, Some(vec![1]));
    assert_eq!(stream.completed_problems.len(), 1);
    assert_eq!(stream.total_problems, Some(3));
}

#[test]
fn failed_reparse_keeps_previous_result() {
    let result = ResultBuilder::new()
        .problem(ProblemBuilder::new(1).answered(42).build())
        .problem(ProblemBuilder::new(2).answered(40).build())
        .build();

    let state = run(&[
        start("a1", StreamType::Initial, None),
        complete("a1", Some(result.clone()), None),
        start("a1", StreamType::Reparse, Some(1)),
        ParsingAction::StreamReparseProgress {
            attachment_id: "a1".to_string(),
            current: 0,
            total: 1,
        },
        ParsingAction::failed("a1", "Image could not be read", Some("BAD_IMAGE")),
    ]);

    assert!(!is_parsing_attachment(&state, "a1"));
    assert_eq!(last_result(&state, "a1"), Some(&result));
    let error = last_error(&state, "a1").unwrap();
    assert_eq!(error.message, "Image could not be read");
    assert_eq!(error.code.as_deref(), Some("BAD_IMAGE"));
}

#[test]
fn start_then_fail_immediately() {
    let state = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::failed("a1", "upstream 500", None),
    ]);
    assert!(state.active_streams().get("a1").is_none());
    assert_eq!(last_error(&state, "a1").map(|e| e.message.as_str()), Some("upstream 500"));
}

#[test]
fn concurrent_attachments_do_not_interact() {
    let state = run(&[
        start("a1", StreamType::Initial, None),
        start("a2", StreamType::Reparse, Some(2)),
        ParsingAction::output("a1", "{"),
        ParsingAction::StreamReparseProgress {
            attachment_id: "a2".to_string(),
            current: 1,
            total: 2,
        },
        ParsingAction::failed("a1", "boom", None),
    ]);

    assert_eq!(get_active_parsing_count(&state), 1);
    assert!(last_error(&state, "a2").is_none());
    let a2 = get_streaming_state(&state, "a2").unwrap();
    assert_eq!(a2.status, StreamingStatus::Processing);
    assert_eq!(a2.progress_message.as_deref(), Some("Analyzing problem 2 of 2..."));
}

#[test]
fn late_events_after_cancel_are_dropped() {
    let cancelled = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::cancel("a1"),
    ]);
    let after = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::cancel("a1"),
        ParsingAction::reasoning("a1", "late", true),
        ParsingAction::output("a1", "late"),
        problem_complete("a1", 1, None),
    ]);

    assert_eq!(cancelled, after);
    assert!(after.last_errors().is_empty());
}

#[test]
fn new_attempt_clears_error_until_it_fails_again() {
    let state = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::failed("a1", "first", None),
        start("a1", StreamType::Initial, None),
    ]);
    assert!(last_error(&state, "a1").is_none());

    let state = parsing_reducer(&state, &ParsingAction::failed("a1", "second", None));
    assert_eq!(last_error(&state, "a1").map(|e| e.message.as_str()), Some("second"));
}

#[test]
fn cancel_all_then_reset() {
    let state = run(&[
        start("a1", StreamType::Initial, None),
        ParsingAction::failed("a1", "x", None),
        start("a2", StreamType::Initial, None),
        start("a3", StreamType::Initial, None),
        ParsingAction::CancelAll,
    ]);
    assert_eq!(get_active_parsing_count(&state), 0);
    assert!(last_error(&state, "a1").is_some());

    let state = parsing_reducer(&state, &ParsingAction::Reset);
    assert_eq!(state, ParsingContextState::initial());
}

#[test]
fn replay_from_json_action_log() {
    let log = r#"[
        {"type": "START_STREAMING", "attachmentId": "a1", "streamType": "initial"},
        {"type": "STREAM_REASONING", "attachmentId": "a1", "text": "Counting rows", "append": false},
        {"type": "STREAM_REASONING", "attachmentId": "a1", "text": "...", "append": true},
        {"type": "SOME_FUTURE_ACTION", "attachmentId": "a1"},
        {"type": "STREAM_PROGRESS_MESSAGE", "attachmentId": "a1", "message": "Almost done"}
    ]"#;
    let actions: Vec<ParsingAction> = serde_json::from_str(log).unwrap();
    let state = run(&actions);

    let stream = get_streaming_state(&state, "a1").unwrap();
    assert_eq!(stream.reasoning_text, "Counting rows...");
    assert_eq!(stream.progress_message.as_deref(), Some("Almost done"));
    assert_eq!(stream.status, StreamingStatus::Reasoning);
}

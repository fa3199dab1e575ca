//! Drives server-sent parse streams into a [`ParsingStore`].
//!
//! One tokio task per attachment reads the response body, decodes SSE frames
//! and dispatches the resulting actions in order. Cancellation aborts the
//! task (dropping the body closes the connection) and then records the
//! cancel in the store.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::Instrument;

use crate::broadcast::ParsingStore;
use crate::config::ParsingConfig;
use crate::error::DriverError;
use crate::parsing::{is_parsing_attachment, ParsingAction, StreamType};
use crate::stream::{ProblemExtractor, SseDecoder, SseFrame, StreamEvent};

/// Error code recorded when the body yields a transport error.
pub const NETWORK_ERROR_CODE: &str = "NETWORK_ERROR";
/// Error code recorded when the body ends before a terminal event.
pub const STREAM_CLOSED_CODE: &str = "STREAM_CLOSED";

/// What to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub attachment_id: String,
    pub stream_type: StreamType,
    pub total_problems: Option<usize>,
}

impl StreamRequest {
    pub fn initial(attachment_id: &str) -> Self {
        Self {
            attachment_id: attachment_id.to_string(),
            stream_type: StreamType::Initial,
            total_problems: None,
        }
    }

    pub fn reparse(attachment_id: &str, total_problems: usize) -> Self {
        Self {
            attachment_id: attachment_id.to_string(),
            stream_type: StreamType::Reparse,
            total_problems: Some(total_problems),
        }
    }
}

/// Handle to a running stream task.
pub struct StreamHandle {
    attachment_id: String,
    join: JoinHandle<()>,
}

impl StreamHandle {
    pub fn attachment_id(&self) -> &str {
        &self.attachment_id
    }

    /// Waits for the task. Returns false if it was cancelled or superseded.
    pub async fn wait(self) -> bool {
        self.join.await.is_ok()
    }
}

struct TaskEntry {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Debug, Clone, Copy)]
struct StreamOptions {
    extract_problems: bool,
    low_confidence_threshold: f32,
}

type TaskMap = HashMap<String, TaskEntry>;

pub struct ParsingDriver {
    store: Arc<ParsingStore>,
    max_concurrent_streams: usize,
    options: StreamOptions,
    tasks: Arc<Mutex<TaskMap>>,
    next_generation: AtomicU64,
}

impl ParsingDriver {
    pub fn new(store: Arc<ParsingStore>, config: &ParsingConfig) -> Self {
        Self {
            store,
            max_concurrent_streams: config.max_concurrent_streams,
            options: StreamOptions {
                extract_problems: config.extract_problems_from_output,
                low_confidence_threshold: config.low_confidence_threshold,
            },
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<ParsingStore> {
        &self.store
    }

    /// Number of stream tasks still running.
    pub fn running_streams(&self) -> usize {
        lock_tasks(&self.tasks).len()
    }

    /// Starts streaming `body` for the request's attachment.
    ///
    /// A stream already running for the same attachment is aborted first.
    pub fn start<S, B, E>(&self, request: StreamRequest, body: S) -> Result<StreamHandle, DriverError>
    where
        S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DriverError::RuntimeUnavailable(e.to_string()))?;

        let attachment_id = request.attachment_id.clone();
        let mut tasks = lock_tasks(&self.tasks);

        if !tasks.contains_key(&attachment_id) && tasks.len() >= self.max_concurrent_streams {
            return Err(DriverError::TooManyStreams {
                limit: self.max_concurrent_streams,
            });
        }

        if let Some(previous) = tasks.remove(&attachment_id) {
            info!("Superseding running parse stream for {}", attachment_id);
            previous.handle.abort();
        }

        self.store.dispatch(ParsingAction::StartStreaming {
            attachment_id: attachment_id.clone(),
            stream_type: request.stream_type,
            total_problems: request.total_problems,
        });

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let span = tracing::info_span!(
            "parse_stream",
            attachment_id = %attachment_id,
            stream_type = %request.stream_type,
            generation
        );

        let store = Arc::clone(&self.store);
        let slot = TaskSlot {
            registry: Arc::clone(&self.tasks),
            attachment_id: attachment_id.clone(),
            generation,
        };
        let options = self.options;
        let join = runtime.spawn(
            async move {
                run_stream(&store, &slot, options, body).await;
                slot.release();
            }
            .instrument(span),
        );

        tasks.insert(
            attachment_id.clone(),
            TaskEntry {
                generation,
                handle: join.abort_handle(),
            },
        );

        Ok(StreamHandle {
            attachment_id,
            join,
        })
    }

    /// Aborts the attachment's stream and records the cancellation.
    ///
    /// Returns true if there was anything to cancel.
    pub fn cancel(&self, attachment_id: &str) -> bool {
        // Held through the dispatch so the task cannot record anything after it.
        let mut tasks = lock_tasks(&self.tasks);
        let aborted = match tasks.remove(attachment_id) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        };

        let applied = self.store.dispatch(ParsingAction::cancel(attachment_id));
        drop(tasks);
        if aborted || applied {
            info!("Cancelled parse stream for {}", attachment_id);
        }
        aborted || applied
    }

    /// Aborts every stream and clears the active registry.
    pub fn cancel_all(&self) {
        let mut tasks = lock_tasks(&self.tasks);
        let count = tasks.len();
        for (_, entry) in tasks.drain() {
            entry.handle.abort();
        }
        self.store.dispatch(ParsingAction::CancelAll);
        drop(tasks);
        info!("Cancelled {} parse stream(s)", count);
    }
}

/// A stream task's claim on its attachment.
///
/// `abort()` only lands at the task's next await, so a superseded or
/// cancelled task may still be decoding a chunk. Every dispatch goes through
/// the slot, which checks ownership under the registry lock.
struct TaskSlot {
    registry: Arc<Mutex<TaskMap>>,
    attachment_id: String,
    generation: u64,
}

impl TaskSlot {
    fn owns(&self, tasks: &TaskMap) -> bool {
        tasks
            .get(&self.attachment_id)
            .is_some_and(|entry| entry.generation == self.generation)
    }

    /// Runs `f` while this task still owns the attachment.
    fn with_ownership<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let tasks = lock_tasks(&self.registry);
        if !self.owns(&tasks) {
            debug!(
                "Dropping output of superseded parse stream for {} (generation {})",
                self.attachment_id, self.generation
            );
            return None;
        }
        Some(f())
    }

    /// Returns false once the task no longer owns the attachment.
    fn dispatch(&self, store: &ParsingStore, action: ParsingAction) -> bool {
        self.with_ownership(|| store.dispatch(action)).is_some()
    }

    fn release(&self) {
        let mut tasks = lock_tasks(&self.registry);
        if self.owns(&tasks) {
            tasks.remove(&self.attachment_id);
        }
    }
}

fn lock_tasks(tasks: &Mutex<TaskMap>) -> MutexGuard<'_, TaskMap> {
    match tasks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Stream task registry lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

async fn run_stream<S, B, E>(store: &ParsingStore, slot: &TaskSlot, options: StreamOptions, mut body: S)
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let attachment_id = slot.attachment_id.as_str();
    let mut decoder = SseDecoder::new();
    let mut pump = EventPump {
        store,
        slot,
        options,
        extractor: options.extract_problems.then(ProblemExtractor::new),
    };

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for frame in decoder.push(bytes.as_ref()) {
                    if pump.handle_frame(&frame) {
                        debug!("Parse stream for {} finished", attachment_id);
                        return;
                    }
                }
            }
            Err(e) => {
                warn!("Parse stream for {} failed: {}", attachment_id, e);
                slot.dispatch(
                    store,
                    ParsingAction::failed(
                        attachment_id,
                        &format!("Connection error: {}", e),
                        Some(NETWORK_ERROR_CODE),
                    ),
                );
                return;
            }
        }
    }

    if let Some(frame) = decoder.finish() {
        if pump.handle_frame(&frame) {
            return;
        }
    }

    slot.with_ownership(|| {
        if store.with_state(|state| is_parsing_attachment(state, attachment_id)) {
            warn!("Parse stream for {} closed before completing", attachment_id);
            store.dispatch(ParsingAction::failed(
                attachment_id,
                "Stream closed before parsing completed",
                Some(STREAM_CLOSED_CODE),
            ));
        }
    });
}

/// Turns decoded frames into dispatched actions for one attachment.
struct EventPump<'a> {
    store: &'a ParsingStore,
    slot: &'a TaskSlot,
    options: StreamOptions,
    extractor: Option<ProblemExtractor>,
}

impl EventPump<'_> {
    /// Returns true once the stream should stop: a terminal event was
    /// dispatched or the task lost its attachment.
    fn handle_frame(&mut self, frame: &SseFrame) -> bool {
        let attachment_id = self.slot.attachment_id.as_str();
        let event = match StreamEvent::from_frame(frame) {
            Ok(Some(event)) => event,
            Ok(None) => return false,
            Err(e) => {
                warn!("Skipping undecodable event for {}: {}", attachment_id, e);
                return false;
            }
        };

        let terminal = event.is_terminal();

        // Problems found in this delta are dispatched first so the output
        // progress message counts them.
        if let (StreamEvent::OutputDelta { text }, Some(extractor)) = (&event, self.extractor.as_mut()) {
            for problem in extractor.push(text) {
                let action = ParsingAction::StreamProblemComplete {
                    attachment_id: attachment_id.to_string(),
                    problem,
                    problem_index: None,
                };
                if !self.slot.dispatch(self.store, action) {
                    return true;
                }
            }
        }

        if let Some(action) = event.into_action(attachment_id, self.options.low_confidence_threshold) {
            if !self.slot.dispatch(self.store, action) {
                return true;
            }
        }
        terminal
    }
}

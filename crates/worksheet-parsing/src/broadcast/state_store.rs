//! Shared parsing state with change notifications.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::parsing::{reduce, ParsingAction, ParsingContextState, Reduction, StreamingStatus};

/// Emitted after every applied action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChangeEvent {
    /// Attachment the action addressed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,
    /// Wire name of the applied action.
    pub action: &'static str,
    /// Stream status after the action; `None` once the stream is gone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StreamingStatus>,
    pub timestamp: DateTime<Utc>,
}

/// Owns the current [`ParsingContextState`] and runs the reducer.
///
/// Readers get cheap snapshots; every applied action is broadcast to
/// subscribers.
pub struct ParsingStore {
    state: RwLock<ParsingContextState>,
    sender: Arc<broadcast::Sender<StateChangeEvent>>,
}

impl ParsingStore {
    /// Creates an empty store with the given broadcast channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            state: RwLock::new(ParsingContextState::initial()),
            sender: Arc::new(sender),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ParsingContextState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Parsing state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, ParsingContextState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Parsing state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Applies an action. Returns true if the state changed.
    pub fn dispatch(&self, action: ParsingAction) -> bool {
        let event = {
            let mut state = self.write();
            match reduce(&state, &action) {
                Reduction::Applied(next) => {
                    let attachment_id = action.attachment_id().map(|id| id.to_string());
                    let status = attachment_id
                        .as_deref()
                        .and_then(|id| next.active_streams().get(id))
                        .map(|stream| stream.status);
                    *state = next;
                    StateChangeEvent {
                        attachment_id,
                        action: action.kind(),
                        status,
                        timestamp: Utc::now(),
                    }
                }
                Reduction::Ignored(reason) => {
                    log::debug!(
                        "Ignored {} for {}: {}",
                        action.kind(),
                        action.attachment_id().unwrap_or("<all>"),
                        reason
                    );
                    return false;
                }
            }
        };

        // No active receivers is fine
        let _ = self.sender.send(event);
        true
    }

    /// Current state. Shares storage with the store until the next change.
    pub fn snapshot(&self) -> ParsingContextState {
        self.read().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn with_state<R>(&self, f: impl FnOnce(&ParsingContextState) -> R) -> R {
        f(&self.read())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ParsingStore {
    fn default() -> Self {
        Self::new(100)
    }
}

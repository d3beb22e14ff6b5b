//! Runtime for driving an ask session
//!
//! The runtime task exclusively owns the view-state, history and example
//! set. Everything else talks to it through a `SessionHandle`.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::history::HistoryEntry;
use crate::state_machine::{Event, ViewState};
use crate::suggestions::ExampleSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Events sent to observers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChange { view: ViewState },
    /// The reveal moved on. The answer text arrived with the last
    /// `StateChange` into `RevealingAnswer`.
    RevealProgress { submission: u64, revealed: usize },
    HistoryChanged { entries: Vec<HistoryEntry> },
    ExamplesRotated { examples: ExampleSet },
}

/// Latest observable state of the session
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub view: ViewState,
    /// Most recent first
    pub history: Vec<HistoryEntry>,
    pub examples: ExampleSet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session runtime has stopped")]
    Closed,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: mpsc::UnboundedSender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    next_submission: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    /// Submit a prompt; returns the submission id that tags its events.
    ///
    /// Ids are handed out in call order, so the latest call always wins.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the runtime has stopped.
    pub fn submit(&self, prompt: impl Into<String>, max_tokens: u32) -> Result<u64, SessionError> {
        let submission = self.next_submission.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(Event::Submit {
            submission,
            prompt: prompt.into(),
            max_tokens,
        })?;
        Ok(submission)
    }

    /// Pre-fill the prompt field, dropping any answer or error on screen
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the runtime has stopped.
    pub fn select_prompt(&self, prompt: impl Into<String>) -> Result<(), SessionError> {
        self.send(Event::SelectPrompt {
            prompt: prompt.into(),
        })
    }

    /// Select a history entry by id; `false` if it is no longer in history
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the runtime has stopped.
    pub fn select_history(&self, id: u64) -> Result<bool, SessionError> {
        let prompt = self
            .snapshot_rx
            .borrow()
            .history
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.prompt.clone());
        match prompt {
            Some(prompt) => self.select_prompt(prompt).map(|()| true),
            None => Ok(false),
        }
    }

    /// Select one of the currently offered examples by position
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the runtime has stopped.
    pub fn select_example(&self, index: usize) -> Result<bool, SessionError> {
        let prompt = self
            .snapshot_rx
            .borrow()
            .examples
            .get(index)
            .map(str::to_string);
        match prompt {
            Some(prompt) => self.select_prompt(prompt).map(|()| true),
            None => Ok(false),
        }
    }

    /// Empty the history list
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Closed`] once the runtime has stopped.
    pub fn clear_history(&self) -> Result<(), SessionError> {
        self.send(Event::ClearHistory)
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the runtime; pending reveals and requests are cancelled
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn send(&self, event: Event) -> Result<(), SessionError> {
        if self.shutdown.is_cancelled() {
            return Err(SessionError::Closed);
        }
        self.event_tx.send(event).map_err(|_| SessionError::Closed)
    }
}

//! Session view-state types

use crate::ask::Answer;
use crate::render::RenderedAnswer;
use std::sync::Arc;
use std::time::Duration;

/// Externally observable state of the session.
///
/// Exactly one variant is current; every variant past `Idle` carries the
/// submission id it belongs to so late events from older submissions can be
/// recognized and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Ready for input. `draft` pre-fills the prompt field; `notice` holds a
    /// validation message after an empty submit.
    Idle {
        draft: String,
        notice: Option<String>,
    },

    /// Request in flight
    Loading { submission: u64, prompt: String },

    /// Answer received, typewriter reveal running
    RevealingAnswer {
        submission: u64,
        prompt: String,
        answer: Arc<Answer>,
        /// Characters of `answer.text` revealed so far
        revealed: usize,
    },

    /// Reveal finished, answer rendered as markup
    ShowingRenderedAnswer {
        submission: u64,
        prompt: String,
        answer: Arc<Answer>,
        rendered: RenderedAnswer,
    },

    /// The request failed; a new submit recovers
    Errored {
        submission: u64,
        prompt: String,
        message: String,
    },
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::Idle {
            draft: String::new(),
            notice: None,
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn idle_with_draft(draft: impl Into<String>) -> Self {
        ViewState::Idle {
            draft: draft.into(),
            notice: None,
        }
    }

    /// Submission this state belongs to, if any
    #[must_use]
    pub fn submission(&self) -> Option<u64> {
        match self {
            ViewState::Idle { .. } => None,
            ViewState::Loading { submission, .. }
            | ViewState::RevealingAnswer { submission, .. }
            | ViewState::ShowingRenderedAnswer { submission, .. }
            | ViewState::Errored { submission, .. } => Some(*submission),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle { .. } => "idle",
            ViewState::Loading { .. } => "loading",
            ViewState::RevealingAnswer { .. } => "revealing_answer",
            ViewState::ShowingRenderedAnswer { .. } => "showing_rendered_answer",
            ViewState::Errored { .. } => "errored",
        }
    }

    /// Waiting on the network or the reveal timer
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ViewState::Loading { .. } | ViewState::RevealingAnswer { .. }
        )
    }

    /// Prompt the state is about (the draft when idle)
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            ViewState::Idle { draft, .. } => draft,
            ViewState::Loading { prompt, .. }
            | ViewState::RevealingAnswer { prompt, .. }
            | ViewState::ShowingRenderedAnswer { prompt, .. }
            | ViewState::Errored { prompt, .. } => prompt,
        }
    }

    /// Text visible in the answer area while revealing or after rendering
    #[must_use]
    pub fn partial(&self) -> Option<&str> {
        match self {
            ViewState::RevealingAnswer {
                answer, revealed, ..
            } => Some(answer.prefix(*revealed)),
            ViewState::ShowingRenderedAnswer { answer, .. } => Some(&answer.text),
            _ => None,
        }
    }
}

/// Immutable per-session configuration the transition function reads
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Delay between revealed characters
    pub reveal_delay: Duration,
}

impl SessionContext {
    #[must_use]
    pub fn new(session_id: impl Into<String>, reveal_delay: Duration) -> Self {
        Self {
            session_id: session_id.into(),
            reveal_delay,
        }
    }
}

//! Events that drive the session

use crate::ask::AskResult;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Submit {
        submission: u64,
        prompt: String,
        max_tokens: u32,
    },
    /// A history entry or example prompt was picked
    SelectPrompt { prompt: String },
    ClearHistory,

    // Request events
    AnswerReady { submission: u64, result: AskResult },

    // Reveal events
    RevealProgress { submission: u64, revealed: usize },
    RevealFinished { submission: u64 },
}

impl Event {
    /// Submission this event was produced for, if it belongs to one
    #[must_use]
    pub fn submission(&self) -> Option<u64> {
        match self {
            Event::Submit { submission, .. }
            | Event::AnswerReady { submission, .. }
            | Event::RevealProgress { submission, .. }
            | Event::RevealFinished { submission } => Some(*submission),
            Event::SelectPrompt { .. } | Event::ClearHistory => None,
        }
    }
}

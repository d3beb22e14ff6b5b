//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop any running reveal before anything else happens
    CancelReveal,

    /// Abandon the in-flight request, its result will be stale anyway
    AbortRequest,

    /// Send the prompt through the request controller (spawns a task)
    RequestAnswer {
        submission: u64,
        prompt: String,
        max_tokens: u32,
    },

    /// Start the typewriter over the answer text
    StartReveal {
        submission: u64,
        text: String,
        per_char: Duration,
    },

    /// Push a completed exchange into history
    RecordHistory { prompt: String, answer: String },

    ClearHistory,

    /// Replace the example set, never offering `exclude`
    RotateExamples { exclude: Option<String> },

    /// Notify observers of the new view-state
    PublishState,

    /// Notify observers that the reveal moved on; only the count changed
    PublishProgress,
}

impl Effect {
    #[must_use]
    pub fn request_answer(submission: u64, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Effect::RequestAnswer {
            submission,
            prompt: prompt.into(),
            max_tokens,
        }
    }

    #[must_use]
    pub fn rotate_excluding(prompt: impl Into<String>) -> Self {
        Effect::RotateExamples {
            exclude: Some(prompt.into()),
        }
    }
}

//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! new state and effects; the runtime performs the I/O.

use super::{Effect, Event, SessionContext, ViewState};
use crate::ask::EMPTY_PROMPT_MESSAGE;
use crate::render::RenderedAnswer;
use std::sync::Arc;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ViewState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    #[must_use]
    pub fn new(state: ViewState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The event belongs to a submission that has been superseded
    #[error("Event for superseded submission {submission} ignored")]
    Stale { submission: u64 },
    /// A submit reused or went back on an id
    #[error("Submission {submission} is not newer than {current}")]
    OutOfOrderSubmission { submission: u64, current: u64 },
}

/// Compute the next state and the effects to run for `event`.
///
/// # Errors
///
/// Rejects events of superseded submissions and submits that do not move
/// the submission id forward; the caller keeps the current state.
pub fn transition(
    state: &ViewState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Submission: any state, the newest submit always wins
        // ============================================================
        (
            _,
            Event::Submit {
                submission,
                prompt,
                max_tokens,
            },
        ) => {
            if let Some(current) = state.submission() {
                if submission <= current {
                    return Err(TransitionError::OutOfOrderSubmission {
                        submission,
                        current,
                    });
                }
            }

            let trimmed = prompt.trim();
            // A blank prompt never displaces an answer that is on its way
            if trimmed.is_empty() && state.is_busy() {
                return Ok(TransitionResult::new(state.clone()));
            }
            if trimmed.is_empty() {
                return Ok(TransitionResult::new(ViewState::Idle {
                    draft: prompt,
                    notice: Some(EMPTY_PROMPT_MESSAGE.to_string()),
                })
                .with_effects([Effect::CancelReveal, Effect::AbortRequest, Effect::PublishState]));
            }

            let prompt = trimmed.to_string();
            Ok(TransitionResult::new(ViewState::Loading {
                submission,
                prompt: prompt.clone(),
            })
            .with_effects([
                Effect::CancelReveal,
                Effect::AbortRequest,
                Effect::PublishState,
                Effect::request_answer(submission, prompt, max_tokens),
            ]))
        }

        // ============================================================
        // Selection: back to Idle with the prompt pre-filled
        // ============================================================
        (_, Event::SelectPrompt { prompt }) => {
            Ok(TransitionResult::new(ViewState::idle_with_draft(prompt)).with_effects([
                Effect::CancelReveal,
                Effect::AbortRequest,
                Effect::PublishState,
            ]))
        }

        (_, Event::ClearHistory) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ClearHistory))
        }

        // ============================================================
        // Request outcome
        // ============================================================
        (
            ViewState::Loading { submission, prompt },
            Event::AnswerReady {
                submission: answered,
                result,
            },
        ) if *submission == answered => match result {
            Ok(answer) => {
                let text = answer.text.clone();
                Ok(TransitionResult::new(ViewState::RevealingAnswer {
                    submission: *submission,
                    prompt: prompt.clone(),
                    answer: Arc::new(answer),
                    revealed: 0,
                })
                .with_effect(Effect::PublishState)
                .with_effect(Effect::StartReveal {
                    submission: *submission,
                    text,
                    per_char: context.reveal_delay,
                }))
            }
            Err(error) => Ok(TransitionResult::new(ViewState::Errored {
                submission: *submission,
                prompt: prompt.clone(),
                message: error.message,
            })
            .with_effect(Effect::PublishState)),
        },

        // ============================================================
        // Reveal progress and completion
        // ============================================================
        (
            ViewState::RevealingAnswer {
                submission,
                prompt,
                answer,
                ..
            },
            Event::RevealProgress {
                submission: ticked,
                revealed,
            },
        ) if *submission == ticked => Ok(TransitionResult::new(ViewState::RevealingAnswer {
            submission: *submission,
            prompt: prompt.clone(),
            answer: Arc::clone(answer),
            revealed: revealed.min(answer.char_len()),
        })
        .with_effect(Effect::PublishProgress)),

        (
            ViewState::RevealingAnswer {
                submission,
                prompt,
                answer,
                ..
            },
            Event::RevealFinished { submission: done },
        ) if *submission == done => {
            let rendered = RenderedAnswer::from_markdown(&answer.text);
            Ok(TransitionResult::new(ViewState::ShowingRenderedAnswer {
                submission: *submission,
                prompt: prompt.clone(),
                answer: Arc::clone(answer),
                rendered,
            })
            .with_effects([
                Effect::PublishState,
                Effect::RecordHistory {
                    prompt: prompt.clone(),
                    answer: answer.text.clone(),
                },
                Effect::rotate_excluding(prompt.clone()),
            ]))
        }

        // ============================================================
        // Anything else came from a submission that is no longer current
        // ============================================================
        (
            _,
            Event::AnswerReady { submission, .. }
            | Event::RevealProgress { submission, .. }
            | Event::RevealFinished { submission },
        ) => Err(TransitionError::Stale { submission }),
    }
}

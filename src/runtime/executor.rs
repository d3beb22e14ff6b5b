//! Session runtime executor

use super::{SessionEvent, SessionHandle, SessionSnapshot};
use crate::ask::{AskTransport, RequestController};
use crate::history::HistoryStore;
use crate::reveal::RevealEngine;
use crate::state_machine::{transition, Effect, Event, SessionContext, TransitionError, ViewState};
use crate::suggestions::{ExampleSampler, ExampleSet, EXAMPLES_PER_ROTATION};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

const BROADCAST_CAPACITY: usize = 256;

/// Session runtime, generic over the transport the requests go through
pub struct SessionRuntime<T>
where
    T: AskTransport + 'static,
{
    context: SessionContext,
    state: ViewState,
    controller: Arc<RequestController<T>>,
    reveal: RevealEngine,
    history: HistoryStore,
    sampler: ExampleSampler,
    examples: ExampleSet,
    event_rx: mpsc::UnboundedReceiver<Event>,
    /// Loopback for request tasks and reveal callbacks
    event_tx: mpsc::UnboundedSender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Token to cancel the in-flight request task
    request_cancel_token: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl<T> SessionRuntime<T>
where
    T: AskTransport + 'static,
{
    #[must_use]
    pub fn new(context: SessionContext, controller: RequestController<T>) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let sampler = ExampleSampler::default();
        let examples = sampler.sample(EXAMPLES_PER_ROTATION, None);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            view: ViewState::default(),
            history: Vec::new(),
            examples: examples.clone(),
        });
        let shutdown = CancellationToken::new();

        let handle = SessionHandle {
            event_tx: event_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
            snapshot_rx,
            next_submission: Arc::new(AtomicU64::new(0)),
            shutdown: shutdown.clone(),
        };

        let runtime = Self {
            context,
            state: ViewState::default(),
            controller: Arc::new(controller),
            reveal: RevealEngine::new(),
            history: HistoryStore::new(),
            sampler,
            examples,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            request_cancel_token: None,
            shutdown,
        };
        (runtime, handle)
    }

    /// Use a different example pool (resamples the current set)
    #[must_use]
    pub fn with_sampler(mut self, sampler: ExampleSampler) -> Self {
        self.examples = sampler.sample(EXAMPLES_PER_ROTATION, None);
        self.sampler = sampler;
        self.update_snapshot();
        self
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");
        self.publish_state();
        let _ = self.broadcast_tx.send(SessionEvent::ExamplesRotated {
            examples: self.examples.clone(),
        });

        // Process events in a loop - the runtime holds a sender, so only
        // shutdown ends it
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                Some(event) = self.event_rx.recv() => self.process_event(event),
            }
        }

        self.reveal.cancel();
        if let Some(token) = self.request_cancel_token.take() {
            token.cancel();
        }
        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e @ TransitionError::Stale { .. }) => {
                // Superseded work is not an error and never surfaces
                tracing::debug!(session_id = %self.context.session_id, reason = %e, "Dropping stale event");
                return;
            }
            Err(e) => {
                tracing::warn!(session_id = %self.context.session_id, error = %e, "Event rejected");
                return;
            }
        };

        if self.state.name() != result.new_state.name() {
            tracing::debug!(
                session_id = %self.context.session_id,
                from = self.state.name(),
                to = result.new_state.name(),
                "State transition"
            );
        }
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CancelReveal => {
                if self.reveal.is_active() {
                    tracing::debug!(session_id = %self.context.session_id, "Cancelling reveal");
                }
                self.reveal.cancel();
            }

            Effect::AbortRequest => {
                if let Some(token) = self.request_cancel_token.take() {
                    tracing::debug!(session_id = %self.context.session_id, "Abandoning in-flight request");
                    token.cancel();
                }
            }

            Effect::RequestAnswer {
                submission,
                prompt,
                max_tokens,
            } => self.spawn_request(submission, prompt, max_tokens),

            Effect::StartReveal {
                submission,
                text,
                per_char,
            } => {
                let tick_tx = self.event_tx.clone();
                let done_tx = self.event_tx.clone();
                self.reveal.start(
                    text,
                    per_char,
                    move |revealed| {
                        let _ = tick_tx.send(Event::RevealProgress {
                            submission,
                            revealed,
                        });
                    },
                    move || {
                        let _ = done_tx.send(Event::RevealFinished { submission });
                    },
                );
            }

            Effect::RecordHistory { prompt, answer } => {
                let id = self.history.push(prompt, answer);
                tracing::info!(session_id = %self.context.session_id, entry_id = id, entries = self.history.len(), "History entry recorded");
                self.publish_history();
            }

            Effect::ClearHistory => {
                self.history.clear();
                tracing::info!(session_id = %self.context.session_id, "History cleared");
                self.publish_history();
            }

            Effect::RotateExamples { exclude } => {
                self.examples = self.sampler.sample(EXAMPLES_PER_ROTATION, exclude.as_deref());
                self.update_snapshot();
                let _ = self.broadcast_tx.send(SessionEvent::ExamplesRotated {
                    examples: self.examples.clone(),
                });
            }

            Effect::PublishState => self.publish_state(),
            Effect::PublishProgress => self.publish_progress(),
        }
    }

    fn spawn_request(&mut self, submission: u64, prompt: String, max_tokens: u32) {
        let token = CancellationToken::new();
        if let Some(previous) = self.request_cancel_token.replace(token.clone()) {
            previous.cancel();
        }

        let controller = Arc::clone(&self.controller);
        let event_tx = self.event_tx.clone();
        let session_id = self.context.session_id.clone();

        tokio::spawn(async move {
            let start = Instant::now();
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(session_id = %session_id, submission, "Request superseded");
                }
                result = controller.submit(&prompt, max_tokens) => {
                    let duration_ms = start.elapsed().as_millis();
                    match &result {
                        Ok(answer) => tracing::info!(
                            session_id = %session_id,
                            submission,
                            duration_ms = %duration_ms,
                            model = %answer.model,
                            usage_tokens = ?answer.usage_tokens,
                            "Answer received"
                        ),
                        Err(e) => tracing::warn!(
                            session_id = %session_id,
                            submission,
                            duration_ms = %duration_ms,
                            kind = e.kind.label(),
                            error = %e.message,
                            "Ask failed"
                        ),
                    }
                    let _ = event_tx.send(Event::AnswerReady { submission, result });
                }
            }
        });
    }

    fn publish_state(&self) {
        self.update_snapshot();
        let _ = self.broadcast_tx.send(SessionEvent::StateChange {
            view: self.state.clone(),
        });
    }

    fn publish_progress(&self) {
        let ViewState::RevealingAnswer {
            submission,
            revealed,
            ..
        } = self.state
        else {
            self.publish_state();
            return;
        };
        self.snapshot_tx
            .send_modify(|snapshot| snapshot.view.clone_from(&self.state));
        let _ = self.broadcast_tx.send(SessionEvent::RevealProgress {
            submission,
            revealed,
        });
    }

    fn publish_history(&self) {
        self.update_snapshot();
        let _ = self.broadcast_tx.send(SessionEvent::HistoryChanged {
            entries: self.history.list(),
        });
    }

    fn update_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            view: self.state.clone(),
            history: self.history.list(),
            examples: self.examples.clone(),
        });
    }
}

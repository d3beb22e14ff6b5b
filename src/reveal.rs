//! Timed character-by-character reveal ("typewriter")
//!
//! Every `start` bumps a generation counter. The tick task captures the
//! generation it was started with and becomes a no-op as soon as the counter
//! moves on, so cancellation never depends on the task noticing in time.
//! Callbacks run while the engine lock is held and `cancel` takes the same
//! lock: once `cancel` returns, no callback of the cancelled run can fire.
//! Callbacks must therefore not call back into the engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealPhase {
    #[default]
    Idle,
    Revealing,
    Done,
}

/// Snapshot of the current run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevealState {
    pub source_text: String,
    /// Characters revealed so far, never more than `total`
    pub revealed: usize,
    pub total: usize,
    pub phase: RevealPhase,
}

impl RevealState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == RevealPhase::Revealing
    }

    #[must_use]
    pub fn revealed_text(&self) -> &str {
        crate::ask::char_prefix(&self.source_text, self.revealed)
    }
}

#[derive(Default)]
struct Shared {
    generation: u64,
    state: RevealState,
    cancel: Option<CancellationToken>,
}

#[derive(Clone, Default)]
pub struct RevealEngine {
    shared: Arc<Mutex<Shared>>,
}

impl RevealEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `text`, one character every `per_char`.
    ///
    /// `on_tick` receives the new revealed length after each tick; `on_done`
    /// runs exactly once when the whole text is revealed. Empty text completes
    /// synchronously, before `start` returns. Any previous run is cancelled.
    /// Must be called from within a tokio runtime unless `text` is empty.
    pub fn start<P, D>(&self, text: impl Into<String>, per_char: Duration, on_tick: P, on_done: D)
    where
        P: Fn(usize) + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        let text = text.into();
        let total = text.chars().count();

        let mut shared = self.lock();
        if let Some(token) = shared.cancel.take() {
            token.cancel();
        }
        shared.generation += 1;
        let generation = shared.generation;

        if total == 0 {
            shared.state = RevealState {
                source_text: text,
                revealed: 0,
                total: 0,
                phase: RevealPhase::Done,
            };
            drop(shared);
            on_done();
            return;
        }

        let token = CancellationToken::new();
        shared.cancel = Some(token.clone());
        shared.state = RevealState {
            source_text: text,
            revealed: 0,
            total,
            phase: RevealPhase::Revealing,
        };
        drop(shared);

        tokio::spawn(drive(
            Arc::clone(&self.shared),
            generation,
            token,
            per_char,
            on_tick,
            on_done,
        ));
    }

    /// Stop the current run. No tick or completion of it fires afterwards.
    pub fn cancel(&self) {
        let mut shared = self.lock();
        shared.generation += 1;
        if let Some(token) = shared.cancel.take() {
            token.cancel();
        }
        if shared.state.phase == RevealPhase::Revealing {
            shared.state.phase = RevealPhase::Idle;
        }
    }

    #[must_use]
    pub fn state(&self) -> RevealState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().state.is_active()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn drive<P, D>(
    shared: Arc<Mutex<Shared>>,
    generation: u64,
    token: CancellationToken,
    per_char: Duration,
    on_tick: P,
    on_done: D,
) where
    P: Fn(usize) + Send + 'static,
    D: FnOnce() + Send + 'static,
{
    let mut on_done = Some(on_done);
    loop {
        tokio::select! {
            () = token.cancelled() => return,
            () = tokio::time::sleep(per_char) => {}
        }

        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.generation != generation {
            return;
        }

        guard.state.revealed += 1;
        let revealed = guard.state.revealed;
        on_tick(revealed);

        if revealed >= guard.state.total {
            guard.state.phase = RevealPhase::Done;
            guard.cancel = None;
            if let Some(done) = on_done.take() {
                done();
            }
            return;
        }
    }
}

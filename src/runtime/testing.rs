//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::{SessionEvent, SessionHandle, SessionRuntime};
use crate::ask::{AskError, AskRequest, AskTransport, RequestController, TransportReply};
use crate::state_machine::{SessionContext, ViewState};
use crate::suggestions::ExampleSampler;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that returns queued replies
pub struct MockTransport {
    replies: Mutex<VecDeque<Result<TransportReply, AskError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<AskRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a 200 reply with a well-formed body
    pub fn queue_answer(&self, answer: &str, model: &str, usage_tokens: Option<u64>) {
        let body = json!({
            "answer": answer,
            "model": model,
            "usage_tokens": usage_tokens,
        });
        self.queue_reply(200, &body.to_string());
    }

    /// Queue a raw status/body reply
    pub fn queue_reply(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(TransportReply::new(status, body)));
    }

    /// Queue a failure to reach the service at all
    pub fn queue_failure(&self, error: AskError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    #[must_use]
    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &AskRequest) -> Result<TransportReply, AskError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AskError::transport("No mock reply queued")))
    }
}

#[async_trait]
impl AskTransport for MockTransport {
    async fn send(&self, request: &AskRequest) -> Result<TransportReply, AskError> {
        self.next_reply(request)
    }
}

// ============================================================================
// Delayed Mock Transport (for supersession testing)
// ============================================================================

/// Mock transport that takes its reply at call time, then waits `delay`
pub struct DelayedMockTransport {
    inner: MockTransport,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockTransport {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_answer(&self, answer: &str, model: &str, usage_tokens: Option<u64>) {
        self.inner.queue_answer(answer, model, usage_tokens);
    }

    #[must_use]
    pub fn recorded_requests(&self) -> Vec<AskRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl AskTransport for DelayedMockTransport {
    async fn send(&self, request: &AskRequest) -> Result<TransportReply, AskError> {
        let reply = self.inner.next_reply(request);
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        reply
    }
}

// ============================================================================
// Test Session
// ============================================================================

/// A running session wired to a mock transport
pub struct TestSession<T: AskTransport + 'static> {
    pub handle: SessionHandle,
    pub transport: Arc<T>,
    events: broadcast::Receiver<SessionEvent>,
    /// Every view-state observed so far, in order
    pub seen: Vec<ViewState>,
}

impl<T: AskTransport + 'static> TestSession<T> {
    #[must_use]
    pub fn start(transport: T, reveal_delay: Duration) -> Self {
        Self::start_with_sampler(transport, reveal_delay, ExampleSampler::default())
    }

    #[must_use]
    pub fn start_with_sampler(transport: T, reveal_delay: Duration, sampler: ExampleSampler) -> Self {
        let transport = Arc::new(transport);
        let context = SessionContext::new("test-session", reveal_delay);
        let controller = RequestController::new(Arc::clone(&transport));
        let (runtime, handle) = SessionRuntime::new(context, controller);
        let runtime = runtime.with_sampler(sampler);
        let events = handle.subscribe();
        tokio::spawn(runtime.run());

        Self {
            handle,
            transport,
            events,
            seen: Vec::new(),
        }
    }

    /// Wait until a view-state satisfying `pred` is published
    pub async fn wait_for(
        &mut self,
        pred: impl Fn(&ViewState) -> bool,
        timeout: Duration,
    ) -> Option<ViewState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv()).await;
            match event {
                Ok(Ok(SessionEvent::StateChange { view })) => {
                    self.seen.push(view.clone());
                    if pred(&view) {
                        return Some(view);
                    }
                }
                Ok(Ok(SessionEvent::RevealProgress { submission, revealed })) => {
                    let Some(view) = self.advance_reveal(submission, revealed) else {
                        continue;
                    };
                    self.seen.push(view.clone());
                    if pred(&view) {
                        return Some(view);
                    }
                }
                Ok(Ok(_)) => {}
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
            }
        }
    }

    /// The last observed reveal with its count moved to `revealed`
    fn advance_reveal(&self, submission: u64, revealed: usize) -> Option<ViewState> {
        match self.seen.last()? {
            ViewState::RevealingAnswer {
                submission: current,
                prompt,
                answer,
                ..
            } if *current == submission => Some(ViewState::RevealingAnswer {
                submission,
                prompt: prompt.clone(),
                answer: Arc::clone(answer),
                revealed,
            }),
            _ => None,
        }
    }

    /// Wait for a state by name (e.g. `"errored"`)
    pub async fn wait_for_state(&mut self, name: &str, timeout: Duration) -> Option<ViewState> {
        self.wait_for(|v| v.name() == name, timeout).await
    }

    /// Names of observed states with consecutive repeats collapsed
    #[must_use]
    pub fn seen_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for view in &self.seen {
            if names.last() != Some(&view.name()) {
                names.push(view.name());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ask::EMPTY_PROMPT_MESSAGE;
    use crate::suggestions::EXAMPLE_PROMPTS;

    const WAIT: Duration = Duration::from_secs(30);
    const TICK: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn test_mock_transport() {
        let mock = MockTransport::new();
        mock.queue_reply(400, r#"{"detail":"nope"}"#);

        let request = AskRequest {
            prompt: "hi".to_string(),
            max_tokens: 50,
        };
        let reply = mock.send(&request).await.unwrap();
        assert_eq!(reply.status, 400);

        // Second call should fail (no more replies)
        assert!(mock.send(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Integration test: the full happy path
    #[tokio::test(start_paused = true)]
    async fn test_explain_apis_scenario() {
        let transport = MockTransport::new();
        transport.queue_answer("An API is...", "models/x", Some(42));

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("Explain APIs", 300).unwrap();

        let done = rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();
        assert_eq!(
            rt.seen_names(),
            vec!["idle", "loading", "revealing_answer", "showing_rendered_answer"]
        );

        let ViewState::ShowingRenderedAnswer { answer, rendered, .. } = done else {
            panic!("Expected rendered answer");
        };
        assert_eq!(answer.model, "models/x");
        assert_eq!(answer.usage_tokens, Some(42));
        assert!(rendered.html.contains("An API is..."));

        let requests = rt.transport.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 300);

        tokio::task::yield_now().await;
        let history = rt.handle.snapshot().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "Explain APIs");
        assert_eq!(history[0].answer, "An API is...");
    }

    /// Every tick of the reveal is published, in order
    #[tokio::test(start_paused = true)]
    async fn test_reveal_progress_is_published_per_character() {
        let transport = MockTransport::new();
        transport.queue_answer("abcd", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("letters", 300).unwrap();
        rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();

        let partials: Vec<&str> = rt.seen.iter().filter_map(|v| match v {
            ViewState::RevealingAnswer { .. } => v.partial(),
            _ => None,
        }).collect();
        assert_eq!(partials, vec!["", "a", "ab", "abc", "abcd"]);
    }

    /// Ticks carry only the count; the answer is sent once per reveal
    #[tokio::test(start_paused = true)]
    async fn test_reveal_ticks_publish_only_the_count() {
        let transport = MockTransport::new();
        transport.queue_answer("abcdef", "m", None);

        let rt = TestSession::start(transport, TICK);
        let mut events = rt.handle.subscribe();
        let mut snapshots = rt.handle.watch();
        let submission = rt.handle.submit("letters", 300).unwrap();

        let mut revealing_states = 0;
        let mut counts = Vec::new();
        loop {
            match tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap() {
                SessionEvent::StateChange { view: ViewState::RevealingAnswer { .. } } => revealing_states += 1,
                SessionEvent::StateChange { view: ViewState::ShowingRenderedAnswer { .. } } => break,
                SessionEvent::RevealProgress { submission: s, revealed } => {
                    assert_eq!(s, submission);
                    counts.push(revealed);
                }
                _ => {}
            }
        }

        assert_eq!(revealing_states, 1);
        assert_eq!(counts, vec![1, 2, 3, 4, 5, 6]);
        assert!(snapshots.has_changed().unwrap());
        assert_eq!(snapshots.borrow_and_update().view.name(), "showing_rendered_answer");
    }

    /// Mid-reveal snapshots follow the ticks
    #[tokio::test(start_paused = true)]
    async fn test_snapshot_tracks_reveal_progress() {
        let transport = MockTransport::new();
        transport.queue_answer("An answer long enough to pause in", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("question", 300).unwrap();
        rt.wait_for(|v| matches!(v, ViewState::RevealingAnswer { revealed: 7, .. }), WAIT)
            .await
            .unwrap();

        let view = rt.handle.snapshot().view;
        assert_eq!(view.name(), "revealing_answer");
        assert!(view.partial().is_some_and(|p| p.starts_with("An answ")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_prompt_makes_no_request() {
        let mut rt = TestSession::start(MockTransport::new(), TICK);
        rt.handle.submit("   ", 300).unwrap();

        let idle = rt
            .wait_for(|v| matches!(v, ViewState::Idle { notice: Some(_), .. }), WAIT)
            .await
            .unwrap();
        assert_eq!(
            idle,
            ViewState::Idle {
                draft: "   ".to_string(),
                notice: Some(EMPTY_PROMPT_MESSAGE.to_string())
            }
        );
        assert!(rt.transport.recorded_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_tokens_clamped_on_the_wire() {
        let transport = MockTransport::new();
        transport.queue_answer("a", "m", None);
        transport.queue_answer("b", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        let first = rt.handle.submit("low", 1).unwrap();
        rt.wait_for(|v| v.submission() == Some(first) && v.name() == "showing_rendered_answer", WAIT)
            .await
            .unwrap();
        let second = rt.handle.submit("high", 1_000_000).unwrap();
        rt.wait_for(|v| v.submission() == Some(second) && v.name() == "showing_rendered_answer", WAIT)
            .await
            .unwrap();

        let tokens: Vec<u32> = rt.transport.recorded_requests().iter().map(|r| r.max_tokens).collect();
        assert_eq!(tokens, vec![50, 100_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_error_scenario() {
        let transport = MockTransport::new();
        transport.queue_reply(400, r#"{"detail":"invalid key"}"#);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("Explain APIs", 300).unwrap();

        let errored = rt.wait_for_state("errored", WAIT).await.unwrap();
        assert!(matches!(errored, ViewState::Errored { ref message, .. } if message == "invalid key"));
        assert!(rt.handle.snapshot().history.is_empty());
    }

    /// Errored is recoverable: the next submit runs normally
    #[tokio::test(start_paused = true)]
    async fn test_submit_after_error_recovers() {
        let transport = MockTransport::new();
        transport.queue_failure(AskError::transport("Connection failed: refused"));
        transport.queue_answer("fine now", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("first", 300).unwrap();
        let errored = rt.wait_for_state("errored", WAIT).await.unwrap();
        assert!(matches!(errored, ViewState::Errored { ref message, .. } if message == "Connection failed: refused"));

        rt.handle.submit("second", 300).unwrap();
        rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(rt.handle.snapshot().history.len(), 1);
    }

    /// Submitting mid-reveal cancels the old reveal and records nothing for it
    #[tokio::test(start_paused = true)]
    async fn test_submit_during_reveal_supersedes() {
        let transport = MockTransport::new();
        transport.queue_answer("This first answer is comfortably longer than ten characters", "m", None);
        transport.queue_answer("Second answer", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        let first = rt.handle.submit("First prompt", 300).unwrap();
        rt.wait_for(
            |v| matches!(v, ViewState::RevealingAnswer { submission, revealed: 10, .. } if *submission == first),
            WAIT,
        )
        .await
        .unwrap();

        let second = rt.handle.submit("Second prompt", 300).unwrap();
        let loading = rt.wait_for(|v| v.submission() == Some(second), WAIT).await.unwrap();
        assert_eq!(loading.name(), "loading");
        let mark = rt.seen.len();

        rt.wait_for(|v| v.submission() == Some(second) && v.name() == "showing_rendered_answer", WAIT)
            .await
            .unwrap();
        // Let any stray tick of the first run surface
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;

        assert!(rt.seen.iter().skip(mark).all(|v| v.submission() == Some(second)));
        let history = rt.handle.snapshot().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "Second prompt");
    }

    /// A blank submit while an answer is arriving changes nothing
    #[tokio::test(start_paused = true)]
    async fn test_blank_submit_during_reveal_is_ignored() {
        let transport = MockTransport::new();
        transport.queue_answer("An answer that takes a while to type out", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        let first = rt.handle.submit("Real question", 300).unwrap();
        rt.wait_for(|v| matches!(v, ViewState::RevealingAnswer { revealed: 10, .. }), WAIT)
            .await
            .unwrap();

        rt.handle.submit("  ", 300).unwrap();
        let done = rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();

        assert_eq!(done.submission(), Some(first));
        assert!(rt.seen.iter().all(|v| !matches!(v, ViewState::Idle { notice: Some(_), .. })));
        assert_eq!(rt.transport.recorded_requests().len(), 1);
        tokio::task::yield_now().await;
        let history = rt.handle.snapshot().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "Real question");
    }

    /// A slow answer for an older submission never overwrites the newer one
    #[tokio::test(start_paused = true)]
    async fn test_late_answer_for_superseded_request_is_ignored() {
        let transport = DelayedMockTransport::new(Duration::from_millis(200));
        transport.queue_answer("stale answer", "m", None);
        transport.queue_answer("fresh answer", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        let first = rt.handle.submit("old", 300).unwrap();
        rt.wait_for(|v| v.submission() == Some(first), WAIT).await.unwrap();
        let second = rt.handle.submit("new", 300).unwrap();

        let done = rt
            .wait_for(|v| v.name() == "showing_rendered_answer", WAIT)
            .await
            .unwrap();
        assert_eq!(done.submission(), Some(second));
        assert_eq!(done.partial(), Some("fresh answer"));
        assert!(rt
            .seen
            .iter()
            .all(|v| !(v.submission() == Some(first) && v.name() != "loading")));
        assert_eq!(rt.transport.recorded_requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_keeps_five_most_recent() {
        let transport = MockTransport::new();
        for i in 1..=6 {
            transport.queue_answer(&format!("answer {i}"), "m", None);
        }

        let mut rt = TestSession::start(transport, Duration::from_millis(1));
        for i in 1..=6 {
            let id = rt.handle.submit(format!("prompt {i}"), 300).unwrap();
            rt.wait_for(|v| v.submission() == Some(id) && v.name() == "showing_rendered_answer", WAIT)
                .await
                .unwrap();
        }
        tokio::task::yield_now().await;

        let prompts: Vec<String> = rt.handle.snapshot().history.into_iter().map(|e| e.prompt).collect();
        assert_eq!(
            prompts,
            vec!["prompt 6", "prompt 5", "prompt 4", "prompt 3", "prompt 2"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_excludes_submitted_prompt() {
        let prompt = EXAMPLE_PROMPTS[0];
        let transport = MockTransport::new();
        transport.queue_answer("ok", "m", None);

        let pool = EXAMPLE_PROMPTS.iter().take(4).map(|s| (*s).to_string());
        let mut rt = TestSession::start_with_sampler(transport, TICK, ExampleSampler::new(pool));
        rt.handle.submit(prompt, 300).unwrap();
        rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();
        tokio::task::yield_now().await;

        let examples = rt.handle.snapshot().examples;
        assert_eq!(examples.len(), 3);
        assert!(examples.iter().all(|e| e != prompt));
    }

    /// Picking an example mid-reveal returns to Idle with the prompt filled in
    #[tokio::test(start_paused = true)]
    async fn test_select_example_cancels_reveal() {
        let transport = MockTransport::new();
        transport.queue_answer("A reasonably long answer to interrupt", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        let example = rt.handle.snapshot().examples.get(1).unwrap().to_string();
        rt.handle.submit("question", 300).unwrap();
        rt.wait_for(|v| matches!(v, ViewState::RevealingAnswer { revealed: 3, .. }), WAIT)
            .await
            .unwrap();

        assert!(rt.handle.select_example(1).unwrap());
        let idle = rt.wait_for_state("idle", WAIT).await.unwrap();
        assert_eq!(idle, ViewState::idle_with_draft(example));

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = rt.handle.snapshot();
        assert_eq!(snapshot.view.name(), "idle");
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_history_and_clear() {
        let transport = MockTransport::new();
        transport.queue_answer("forty-two", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("meaning of life", 300).unwrap();
        rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();
        tokio::task::yield_now().await;

        let entry_id = rt.handle.snapshot().history[0].id;
        assert!(rt.handle.select_history(entry_id).unwrap());
        let idle = rt.wait_for_state("idle", WAIT).await.unwrap();
        assert_eq!(idle.prompt(), "meaning of life");

        rt.handle.clear_history().unwrap();
        tokio::time::sleep(TICK).await;
        assert!(rt.handle.snapshot().history.is_empty());
        assert!(!rt.handle.select_history(entry_id).unwrap());
    }

    /// An empty answer completes without any tick
    #[tokio::test(start_paused = true)]
    async fn test_empty_answer_completes_immediately() {
        let transport = MockTransport::new();
        transport.queue_answer("", "m", None);

        let mut rt = TestSession::start(transport, TICK);
        rt.handle.submit("say nothing", 300).unwrap();
        let done = rt.wait_for_state("showing_rendered_answer", WAIT).await.unwrap();
        assert_eq!(done.partial(), Some(""));
        tokio::task::yield_now().await;
        assert_eq!(rt.handle.snapshot().history.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_closes_handle() {
        let rt = TestSession::start(MockTransport::new(), TICK);
        rt.handle.shutdown();
        assert_eq!(
            rt.handle.submit("late", 300),
            Err(super::super::SessionError::Closed)
        );
    }
}

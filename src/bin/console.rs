//! promptline console - line-oriented front end for an ask session
//!
//! Type a question and press Enter. `:help` lists the commands.

use promptline::ask::{clamp_max_tokens, Answer, HttpTransport, RequestController};
use promptline::config::ClientConfig;
use promptline::runtime::{SessionEvent, SessionHandle, SessionRuntime};
use promptline::state_machine::{SessionContext, ViewState};
use promptline::suggestions::ExampleSet;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  <text>        ask a question
  <empty line>  send the pre-filled prompt
  :e N          use example N
  :h N          reuse history entry N
  :history      list recent questions
  :clear        clear history
  :tokens N     set the answer token budget
  :q            quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    SendDraft,
    Example(usize),
    History(usize),
    ListHistory,
    ClearHistory,
    Tokens(u32),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Command::SendDraft;
        }
        let Some(rest) = line.trim().strip_prefix(':') else {
            return Command::Ask(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().and_then(|a| a.parse::<u64>().ok());
        match (name, arg) {
            ("q" | "quit", _) => Command::Quit,
            ("help" | "?", _) => Command::Help,
            ("history", _) => Command::ListHistory,
            ("clear", _) => Command::ClearHistory,
            ("e", Some(n)) if n > 0 => Command::Example(usize::try_from(n - 1).unwrap_or(usize::MAX)),
            ("h", Some(n)) if n > 0 => Command::History(usize::try_from(n - 1).unwrap_or(usize::MAX)),
            ("tokens", Some(n)) => Command::Tokens(clamp_max_tokens(u32::try_from(n).unwrap_or(u32::MAX))),
            _ => Command::Unknown(line.trim().to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptline=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let transport = HttpTransport::new(&config.api_base_url)?;
    tracing::info!(endpoint = %transport.endpoint(), "Using ask endpoint");

    let context = SessionContext::new(uuid::Uuid::new_v4().to_string(), config.reveal_delay);
    let (runtime, handle) = SessionRuntime::new(context, RequestController::new(transport));
    let events = BroadcastStream::new(handle.subscribe());
    let runtime_task = tokio::spawn(runtime.run());
    let printer = tokio::spawn(print_events(events));

    println!("Ask me anything. {HELP}");

    let mut max_tokens = config.max_tokens;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Ask(prompt) => {
                handle.submit(prompt, max_tokens)?;
            }
            Command::SendDraft => {
                let draft = handle.snapshot().view.prompt().to_string();
                handle.submit(draft, max_tokens)?;
            }
            Command::Example(index) => {
                if !handle.select_example(index)? {
                    println!("No example {}", index + 1);
                }
            }
            Command::History(position) => select_history(&handle, position)?,
            Command::ListHistory => print_history(&handle),
            Command::ClearHistory => {
                handle.clear_history()?;
                println!("History cleared.");
            }
            Command::Tokens(n) => {
                max_tokens = n;
                println!("Token budget: {max_tokens}");
            }
            Command::Help => println!("{HELP}"),
            Command::Unknown(input) => println!("Unknown command {input:?}, try :help"),
        }
    }

    handle.shutdown();
    let _ = runtime_task.await;
    printer.abort();
    Ok(())
}

fn select_history(handle: &SessionHandle, position: usize) -> Result<(), Box<dyn std::error::Error>> {
    let entry_id = handle.snapshot().history.get(position).map(|e| e.id);
    match entry_id {
        Some(id) if handle.select_history(id)? => {}
        _ => println!("No history entry {}", position + 1),
    }
    Ok(())
}

fn print_history(handle: &SessionHandle) {
    let history = handle.snapshot().history;
    if history.is_empty() {
        println!("No history yet.");
        return;
    }
    for (i, entry) in history.iter().enumerate() {
        println!(
            "  {}. {} ({})",
            i + 1,
            entry.prompt,
            entry.created_at.format("%H:%M:%S")
        );
    }
}

fn print_examples(examples: &ExampleSet) {
    println!("Try:");
    for (i, example) in examples.iter().enumerate() {
        println!("  :e {}  {example}", i + 1);
    }
}

/// Print state changes as they arrive; the reveal is echoed incrementally
async fn print_events(mut events: BroadcastStream<SessionEvent>) {
    let mut echo: Option<RevealEcho> = None;

    while let Some(event) = events.next().await {
        // Lagged receivers skip ahead
        let Ok(event) = event else { continue };
        match event {
            SessionEvent::StateChange { view } => match &view {
                ViewState::Idle { notice: Some(notice), .. } => println!("{notice}"),
                ViewState::Idle { draft, .. } if !draft.is_empty() => {
                    println!("Prompt: {draft}  (Enter to send)");
                }
                ViewState::Idle { .. } => {}
                ViewState::Loading { prompt, .. } => {
                    echo = None;
                    println!("Asking: {prompt}");
                }
                ViewState::RevealingAnswer {
                    submission,
                    answer,
                    revealed,
                    ..
                } => {
                    let mut started = RevealEcho::new(*submission, Arc::clone(answer));
                    print_fresh(started.advance(*revealed));
                    echo = Some(started);
                }
                ViewState::ShowingRenderedAnswer { answer, rendered, .. } => {
                    echo = None;
                    println!("\n\n{}", rendered.text.trim_end());
                    match answer.usage_tokens {
                        Some(tokens) => println!("[{} · {tokens} tokens]", answer.model),
                        None => println!("[{}]", answer.model),
                    }
                }
                ViewState::Errored { message, .. } => println!("Error: {message}"),
            },
            SessionEvent::RevealProgress { submission, revealed } => {
                if let Some(echo) = echo.as_mut().filter(|e| e.submission == submission) {
                    print_fresh(echo.advance(revealed));
                }
            }
            SessionEvent::ExamplesRotated { examples } => print_examples(&examples),
            SessionEvent::HistoryChanged { .. } => {}
        }
    }
}

fn print_fresh(fresh: &str) {
    if fresh.is_empty() {
        return;
    }
    print!("{fresh}");
    let _ = std::io::stdout().flush();
}

/// How much of a revealing answer has been printed so far
struct RevealEcho {
    submission: u64,
    answer: Arc<Answer>,
    chars: usize,
    bytes: usize,
}

impl RevealEcho {
    fn new(submission: u64, answer: Arc<Answer>) -> Self {
        Self {
            submission,
            answer,
            chars: 0,
            bytes: 0,
        }
    }

    /// Text between the last printed character and `revealed`
    fn advance(&mut self, revealed: usize) -> &str {
        if revealed <= self.chars {
            return "";
        }
        let rest = self.answer.text.get(self.bytes..).unwrap_or_default();
        let end = rest
            .char_indices()
            .nth(revealed - self.chars)
            .map_or(rest.len(), |(i, _)| i);
        let start = self.bytes;
        self.bytes += end;
        self.chars = revealed;
        self.answer.text.get(start..self.bytes).unwrap_or_default()
    }
}

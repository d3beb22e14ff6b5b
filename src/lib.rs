//! promptline - ask an LLM, watch the answer type itself out
//!
//! The client side is an orchestrator around one in-flight ask: a pure
//! transition function over [`state_machine::ViewState`] and a
//! [`runtime::SessionRuntime`] that performs the effects (network call,
//! typewriter reveal, history, example rotation). The server side is a thin
//! axum pass-through to Gemini.

pub mod api;
pub mod ask;
pub mod config;
pub mod history;
pub mod llm;
pub mod render;
pub mod reveal;
pub mod runtime;
pub mod state_machine;
pub mod suggestions;

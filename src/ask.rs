//! Client side of the ask endpoint
//!
//! `RequestController` validates and clamps a submission, hands it to an
//! `AskTransport` and normalizes whatever comes back into an `AskResult`.

mod client;
mod controller;
mod error;
mod types;

pub use client::HttpTransport;
pub use controller::{clamp_max_tokens, interpret_reply, RequestController, EMPTY_PROMPT_MESSAGE};
pub use error::{AskError, AskErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Carries one ask request across the network boundary
#[async_trait]
pub trait AskTransport: Send + Sync {
    /// Send the request and return the raw status and body.
    ///
    /// Only failures to obtain a reply at all are errors here; non-success
    /// statuses come back as a `TransportReply` for the controller to read.
    ///
    /// # Errors
    ///
    /// Returns an [`AskErrorKind::Transport`] error when the service cannot be reached.
    async fn send(&self, request: &AskRequest) -> Result<TransportReply, AskError>;
}

#[async_trait]
impl<T: AskTransport + ?Sized> AskTransport for Arc<T> {
    async fn send(&self, request: &AskRequest) -> Result<TransportReply, AskError> {
        (**self).send(request).await
    }
}

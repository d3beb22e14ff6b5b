//! Request controller: validation, clamping and response normalization

use super::types::{AskRequest, AskResponseBody, AskResult, TransportReply, MAX_MAX_TOKENS, MIN_MAX_TOKENS};
use super::{AskError, AskTransport};
use serde::Deserialize;
use serde_json::Value;

/// Message surfaced when an empty prompt is submitted
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt.";

/// Issues ask requests through a transport and normalizes the outcome.
///
/// The controller never returns an `Err` past `submit`'s `AskResult`: every
/// failure becomes an `AskError` value. Supersession of older submissions is
/// the session runtime's job.
pub struct RequestController<T: AskTransport> {
    transport: T,
}

impl<T: AskTransport> RequestController<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate the prompt, send it, and interpret the reply.
    ///
    /// # Errors
    ///
    /// Every failure comes back as an [`AskError`]: a blank prompt, an
    /// unreachable service, or an error status or body.
    pub async fn submit(&self, prompt: &str, max_tokens: u32) -> AskResult {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AskError::validation(EMPTY_PROMPT_MESSAGE));
        }

        let request = AskRequest {
            prompt: prompt.to_string(),
            max_tokens: clamp_max_tokens(max_tokens),
        };
        tracing::debug!(
            prompt_chars = request.prompt.chars().count(),
            max_tokens = request.max_tokens,
            "Sending ask request"
        );

        let reply = self.transport.send(&request).await?;
        interpret_reply(&reply)
    }
}

/// Clamp a requested token budget into the range the service accepts
#[must_use]
pub fn clamp_max_tokens(max_tokens: u32) -> u32 {
    max_tokens.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Value,
}

/// Turn a raw status/body pair into an `AskResult`
///
/// # Errors
///
/// A non-success status becomes a `Service` error carrying the status; a
/// success body that does not parse becomes a `Transport` error.
pub fn interpret_reply(reply: &TransportReply) -> AskResult {
    if !reply.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&reply.body)
            .ok()
            .and_then(|body| detail_message(body.detail));
        let message =
            detail.unwrap_or_else(|| format!("Request failed with status {}", reply.status));
        return Err(AskError::service(reply.status, message));
    }

    let body: AskResponseBody = serde_json::from_str(&reply.body)
        .map_err(|e| AskError::transport(format!("Malformed response from server: {e}")))?;
    Ok(body.into())
}

fn detail_message(detail: Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        structured => Some(structured.to_string()),
    }
}

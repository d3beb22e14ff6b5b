//! Wire and result types for the ask endpoint

use super::AskError;
use serde::{Deserialize, Serialize};

/// Smallest `max_tokens` the client will send
pub const MIN_MAX_TOKENS: u32 = 50;
/// Largest `max_tokens` the client will send
pub const MAX_MAX_TOKENS: u32 = 100_000;

/// Body of `POST /api/v1/ask`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

/// Successful response body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AskResponseBody {
    pub answer: Option<String>,
    pub model: Option<String>,
    pub usage_tokens: Option<u64>,
}

/// A normalized answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub model: String,
    /// `None` when the service did not report usage; never defaulted to 0
    pub usage_tokens: Option<u64>,
}

impl Answer {
    #[must_use]
    pub fn new(text: impl Into<String>, model: impl Into<String>, usage_tokens: Option<u64>) -> Self {
        Self {
            text: text.into(),
            model: model.into(),
            usage_tokens,
        }
    }

    /// Length in characters, the unit the reveal advances by
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The first `chars` characters of the answer
    #[must_use]
    pub fn prefix(&self, chars: usize) -> &str {
        char_prefix(&self.text, chars)
    }
}

impl From<AskResponseBody> for Answer {
    fn from(body: AskResponseBody) -> Self {
        Self {
            text: body.answer.unwrap_or_default(),
            model: body.model.unwrap_or_default(),
            usage_tokens: body.usage_tokens,
        }
    }
}

/// Outcome of one ask: exactly one of answer or error
pub type AskResult = Result<Answer, AskError>;

/// Raw reply handed back by a transport before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

impl TransportReply {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn char_prefix(text: &str, chars: usize) -> &str {
    let end = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| idx);
    text.get(..end).unwrap_or(text)
}

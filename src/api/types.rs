//! API request and response types

use serde::Serialize;

/// Default when `max_tokens` is omitted from the request
pub const DEFAULT_REQUEST_MAX_TOKENS: u32 = 10_000;
pub const MIN_REQUEST_MAX_TOKENS: i64 = 1;
pub const MAX_REQUEST_MAX_TOKENS: i64 = 100_000;

/// Validated ask request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskPayload {
    pub prompt: String,
    /// `None` when the client sent an explicit null
    pub max_tokens: Option<u32>,
}

/// Response to a successful ask
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub model: Option<String>,
    pub usage_tokens: Option<u64>,
}

/// Response for the health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub app: String,
    pub version: String,
}

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(loc: Vec<serde_json::Value>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Issue located at `body.<field>`
    #[must_use]
    pub fn field(field: &str, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(vec!["body".into(), field.into()], msg, kind)
    }
}

/// Error body: a message, or a list of validation issues
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Issues(Vec<ValidationIssue>),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            detail: ErrorDetail::Message(message.into()),
        }
    }

    #[must_use]
    pub fn issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            detail: ErrorDetail::Issues(issues),
        }
    }
}

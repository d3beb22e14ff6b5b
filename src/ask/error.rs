//! Ask error types

use thiserror::Error;

/// A failed ask, already normalized to a user-visible message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AskError {
    pub kind: AskErrorKind,
    pub message: String,
}

impl AskError {
    #[must_use]
    pub fn new(kind: AskErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AskErrorKind::Validation, message)
    }

    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AskErrorKind::Transport, message)
    }

    #[must_use]
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::new(AskErrorKind::Service { status }, message)
    }
}

/// Where the failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskErrorKind {
    /// Empty prompt, rejected before any network call
    Validation,
    /// Unreachable host, timeout, malformed response body
    Transport,
    /// The service answered with a non-success status
    Service { status: u16 },
}

impl AskErrorKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Service { .. } => "service",
        }
    }
}

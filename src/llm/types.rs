//! Common types for completion calls

use serde::Serialize;

/// A single-prompt completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Provider default when `None`
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, max_tokens: Option<u32>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Normalized provider answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// Model name as configured, e.g. `models/gemini-2.5-flash`
    pub model: String,
    pub usage: Usage,
    pub finish_reason: Option<String>,
}

/// Token counts, each only when the provider reported it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_field_names)]
pub struct Usage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl Usage {
    /// Prompt plus completion tokens; `None` when neither is known
    #[must_use]
    pub fn usage_tokens(&self) -> Option<u64> {
        match (self.prompt_tokens, self.completion_tokens) {
            (None, None) => None,
            (p, c) => Some(p.unwrap_or(0) + c.unwrap_or(0)),
        }
    }
}

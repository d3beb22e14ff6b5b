//! Google Gemini provider implementation

use super::types::{Completion, CompletionRequest, Usage};
use super::{LlmError, LlmService};
use crate::config::DEFAULT_GEMINI_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MAX_TOKENS: u32 = 1024;
const MIN_ALLOWED_TOKENS: u32 = 1;
const MAX_ALLOWED_TOKENS: u32 = 100_000;

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiService {
    /// `model` may be given with or without the `models/` prefix
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a blank API key or an unusable client.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: Option<&str>,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::config(
                "Gemini API key missing in environment variables.",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::config(format!("Failed to initialize Gemini client: {e}")))?;

        let model = model.into();
        let endpoint = generate_content_url(base_url.unwrap_or(DEFAULT_GEMINI_BASE_URL), &model);

        Ok(Self {
            client,
            api_key,
            model,
            endpoint,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn translate_request(request: &CompletionRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: clamp_output_tokens(request.max_tokens),
            },
        }
    }

    fn normalize_response(model: &str, resp: GeminiResponse) -> Result<Completion, LlmError> {
        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            LlmError::empty_answer(
                "Gemini did not return any candidates. This can happen if the request was \
                 blocked by safety filters or the prompt was invalid.",
            )
        })?;

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .filter(|t| !t.is_empty())
            .collect();

        if text.is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("None");
            return Err(LlmError::empty_answer(format!(
                "Gemini returned no text (finish_reason={reason}). This usually means the \
                 response was blocked by safety filters or the model chose not to answer."
            )));
        }

        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(Completion {
            text,
            model: model.to_string(),
            usage,
            finish_reason: candidate.finish_reason,
        })
    }
}

fn generate_content_url(base_url: &str, model: &str) -> String {
    let model = model.trim_start_matches('/');
    let path = if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    };
    format!("{}/v1beta/{path}:generateContent", base_url.trim_end_matches('/'))
}

fn clamp_output_tokens(max_tokens: Option<u32>) -> u32 {
    max_tokens
        .unwrap_or(DEFAULT_MAX_TOKENS)
        .clamp(MIN_ALLOWED_TOKENS, MAX_ALLOWED_TOKENS)
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let gemini_request = Self::translate_request(request);
        tracing::debug!(
            model = %self.model,
            max_output_tokens = gemini_request.generation_config.max_output_tokens,
            prompt_chars = request.prompt.chars().count(),
            "Sending prompt to Gemini"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Gemini API error: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                let message = error_resp.error.message;
                return Err(match status.as_u16() {
                    400 => LlmError::invalid_request(format!("Invalid request: {message}")),
                    401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
                    429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
                    500..=599 => LlmError::server_error(format!("Server error: {message}")),
                    _ => LlmError::unknown(format!("HTTP {status}: {message}")),
                });
            }
            return Err(LlmError::unknown(format!("HTTP {status} error: {body}")));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e}")))?;

        Self::normalize_response(&self.model, gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

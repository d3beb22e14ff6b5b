//! HTTP request handlers

use super::types::{
    AskPayload, AskResponse, ErrorResponse, HealthResponse, ValidationIssue,
    DEFAULT_REQUEST_MAX_TOKENS, MAX_REQUEST_MAX_TOKENS, MIN_REQUEST_MAX_TOKENS,
};
use super::AppState;
use crate::llm::{CompletionRequest, LlmError};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

const MISSING_KEY_MESSAGE: &str = "Gemini API key missing in environment variables.";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/v1/ask", post(ask))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        app: state.app_name,
        version: state.app_version,
    })
}

// ============================================================
// Ask
// ============================================================

async fn ask(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        AppError::Validation(vec![ValidationIssue::new(
            vec!["body".into()],
            rejection.body_text(),
            "value_error.jsondecode",
        )])
    })?;
    let payload = validate_ask(&body).map_err(AppError::Validation)?;

    tracing::info!(
        prompt_chars = payload.prompt.chars().count(),
        max_tokens = ?payload.max_tokens,
        "Received ask request"
    );

    let llm = state
        .llm
        .as_ref()
        .ok_or_else(|| AppError::Internal(MISSING_KEY_MESSAGE.to_string()))?;

    let completion = llm
        .complete(&CompletionRequest::new(payload.prompt, payload.max_tokens))
        .await
        .map_err(AppError::Llm)?;

    tracing::info!(model = %completion.model, "Successfully processed ask request");
    Ok(Json(AskResponse {
        usage_tokens: completion.usage.usage_tokens(),
        answer: completion.text,
        model: Some(completion.model),
    }))
}

/// Check the body shape, collecting every field problem
fn validate_ask(body: &Value) -> Result<AskPayload, Vec<ValidationIssue>> {
    let Some(object) = body.as_object() else {
        return Err(vec![ValidationIssue::new(
            vec!["body".into()],
            "value is not a valid dict",
            "type_error.dict",
        )]);
    };

    let mut issues = Vec::new();

    let prompt = match object.get("prompt") {
        None => {
            issues.push(ValidationIssue::field(
                "prompt",
                "field required",
                "value_error.missing",
            ));
            None
        }
        Some(Value::Null) => {
            issues.push(ValidationIssue::field(
                "prompt",
                "none is not an allowed value",
                "type_error.none.not_allowed",
            ));
            None
        }
        Some(value) => {
            let prompt = coerce_str(value);
            if prompt.is_none() {
                issues.push(ValidationIssue::field(
                    "prompt",
                    "str type expected",
                    "type_error.str",
                ));
            }
            prompt
        }
    };

    let max_tokens = match object.get("max_tokens") {
        None => Some(DEFAULT_REQUEST_MAX_TOKENS),
        Some(Value::Null) => None,
        Some(value) => match coerce_int(value) {
            None => {
                issues.push(ValidationIssue::field(
                    "max_tokens",
                    "value is not a valid integer",
                    "type_error.integer",
                ));
                None
            }
            Some(n) if n < i128::from(MIN_REQUEST_MAX_TOKENS) => {
                issues.push(ValidationIssue::field(
                    "max_tokens",
                    format!("ensure this value is greater than or equal to {MIN_REQUEST_MAX_TOKENS}"),
                    "value_error.number.not_ge",
                ));
                None
            }
            Some(n) if n > i128::from(MAX_REQUEST_MAX_TOKENS) => {
                issues.push(ValidationIssue::field(
                    "max_tokens",
                    format!("ensure this value is less than or equal to {MAX_REQUEST_MAX_TOKENS}"),
                    "value_error.number.not_le",
                ));
                None
            }
            Some(n) => u32::try_from(n).ok(),
        },
    };

    match prompt {
        Some(prompt) if issues.is_empty() => Ok(AskPayload { prompt, max_tokens }),
        _ => Err(issues),
    }
}

/// Strings pass through; numbers and booleans are accepted in their
/// printed form (`123`, `1.5`, `True`).
fn coerce_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        _ => None,
    }
}

/// Integers, decimal strings such as `"300"`, floats (truncated toward
/// zero) and booleans are all read as integers.
#[allow(clippy::cast_possible_truncation)]
fn coerce_int(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i128)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i128::from(*b)),
        _ => None,
    }
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Validation(Vec<ValidationIssue>),
    Llm(LlmError),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(issues) => {
                tracing::debug!(issues = issues.len(), "Rejected ask request");
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorResponse::issues(issues))
            }
            AppError::Llm(e) => {
                tracing::error!(error = %e.message, kind = ?e.kind, "LLM service error");
                let status =
                    StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, ErrorResponse::new(e.message))
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Ask request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
        };

        (status, Json(body)).into_response()
    }
}

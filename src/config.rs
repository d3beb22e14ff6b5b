//! Environment-driven configuration for the console and the server

use crate::ask::clamp_max_tokens;
use std::time::Duration;

/// Base URL used when `PROMPTLINE_API_BASE_URL` is not set (local development)
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REVEAL_MS: u64 = 15;
pub const DEFAULT_MAX_TOKENS: u32 = 300;

pub const DEFAULT_APP_NAME: &str = "LLM API";
pub const DEFAULT_APP_VERSION: &str = "1.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Strip whitespace and trailing slashes so a path can be appended
#[must_use]
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Client (console) configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Delay between revealed characters
    pub reveal_delay: Duration,
    /// Initial token budget, already clamped
    pub max_tokens: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            reveal_delay: Duration::from_millis(DEFAULT_REVEAL_MS),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("PROMPTLINE_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| DEFAULT_API_BASE_URL.to_string(), |v| normalize_base_url(&v));

        let reveal_ms = lookup("PROMPTLINE_REVEAL_MS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_REVEAL_MS);

        let max_tokens = lookup("PROMPTLINE_MAX_TOKENS")
            .and_then(|v| v.trim().parse().ok())
            .map_or(DEFAULT_MAX_TOKENS, clamp_max_tokens);

        Self {
            api_base_url,
            reveal_delay: Duration::from_millis(reveal_ms),
            max_tokens,
        }
    }
}

/// Pass-through server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub app_name: String,
    pub app_version: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_version: DEFAULT_APP_VERSION.to_string(),
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            app_name: non_empty("PROMPTLINE_APP_NAME").unwrap_or(defaults.app_name),
            app_version: non_empty("PROMPTLINE_APP_VERSION").unwrap_or(defaults.app_version),
            port: non_empty("PROMPTLINE_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .map_or(defaults.gemini_base_url, |v| normalize_base_url(&v)),
        }
    }
}

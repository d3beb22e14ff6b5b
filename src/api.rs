//! HTTP API for the ask backend

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::config::ServerConfig;
use crate::llm::LlmService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider could be configured (e.g. missing key)
    pub llm: Option<Arc<dyn LlmService>>,
    pub app_name: String,
    pub app_version: String,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ServerConfig, llm: Option<Arc<dyn LlmService>>) -> Self {
        Self {
            llm,
            app_name: config.app_name.clone(),
            app_version: config.app_version.clone(),
        }
    }
}

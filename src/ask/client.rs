//! HTTP transport for the ask endpoint

use super::types::{AskRequest, TransportReply};
use super::{AskError, AskTransport};
use crate::config::normalize_base_url;
use async_trait::async_trait;
use reqwest::Client;

/// Path of the ask endpoint relative to the base URL
pub const ASK_PATH: &str = "/api/v1/ask";

/// Posts ask requests to `<base-url>/api/v1/ask` with reqwest.
///
/// No request timeout is configured; the transport's own limits apply.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Transport posting to `<base_url>/api/v1/ask`
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("promptline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{ASK_PATH}", normalize_base_url(base_url)),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AskTransport for HttpTransport {
    async fn send(&self, request: &AskRequest) -> Result<TransportReply, AskError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AskError::transport(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AskError::transport(format!("Connection failed: {e}"))
                } else {
                    AskError::transport(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AskError::transport(format!("Failed to read response: {e}")))?;

        tracing::debug!(endpoint = %self.endpoint, status, body_len = body.len(), "Ask reply received");
        Ok(TransportReply { status, body })
    }
}

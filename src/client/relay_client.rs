use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AnalyzeRequest, AnalyzeResponse, Mode};

/// Client side of the relay contract.
#[async_trait]
pub trait AnalyzeClient: Send + Sync {
    /// Exactly one request per call; failures are never retried here.
    async fn analyze(&self, text: &str, mode: Option<Mode>) -> AppResult<String>;

    /// Nudges a sleeping relay instance. Best effort.
    async fn wake(&self) {}
}

/// Talks to a relay over HTTP.
pub struct HttpRelayClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelayClient {
    /// `endpoint` is the full `/analyze` URL.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalyzeClient for HttpRelayClient {
    async fn analyze(&self, text: &str, mode: Option<Mode>) -> AppResult<String> {
        let body = AnalyzeRequest::new(text, mode);
        debug!(endpoint = %self.endpoint, mode = ?mode, text_chars = text.len(), "Calling relay");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::relay_transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Relay returned an error status");
            return Err(AppError::RelayStatus {
                status: status.as_u16(),
            });
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AppError::relay_transport(format!("Invalid relay response: {}", e)))?;
        Ok(parsed.result)
    }

    async fn wake(&self) {
        match self.client.head(&self.endpoint).send().await {
            Ok(_) => info!("Backend wake-up ping sent"),
            Err(e) => warn!(error = %e, "Backend wake-up ping failed"),
        }
    }
}

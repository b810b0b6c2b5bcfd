use std::time::Duration;

use async_trait::async_trait;

use super::event::TelemetryEvent;
use crate::config::SyncConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("config error: {0}")]
    Config(String),
}

impl DeliveryError {
    /// Transport failures, timeouts, 5xx, 408 and 429 may succeed later.
    /// Any other status is a rejection of the payload itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

/// One delivery attempt of one event to the ingestion endpoint.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), DeliveryError>;
}

pub struct HttpEventTransport {
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpEventTransport {
    pub fn new(config: &SyncConfig) -> Result<Self, DeliveryError> {
        Self::with_endpoint(
            config.events_url(),
            config.auth_token.clone(),
            config.request_timeout(),
        )
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(DeliveryError::Config(
                "events endpoint cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            auth_token,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|error| DeliveryError::Config(error.to_string()))?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EventTransport for HttpEventTransport {
    async fn deliver(&self, event: &TelemetryEvent) -> Result<(), DeliveryError> {
        let mut request = self.client.post(&self.endpoint).json(event);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

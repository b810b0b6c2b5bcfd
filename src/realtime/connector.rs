use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};

use super::sse::SseDecoder;
use crate::config::SyncConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("stream error: {0}")]
    Stream(String),
    #[error("config error: {0}")]
    Config(String),
}

/// Text payloads of the push stream, one item per server message.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// Opens one connection to the push endpoint.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self) -> Result<MessageStream, StreamError>;
}

/// Server-Sent Events over a long-lived HTTP GET.
pub struct HttpStreamConnector {
    client: reqwest::Client,
    url: String,
    headers: reqwest::header::HeaderMap,
}

impl HttpStreamConnector {
    pub fn new(config: &SyncConfig) -> Result<Self, StreamError> {
        Self::with_url(
            config.stream_url(),
            config.auth_token.as_deref(),
            config.connect_timeout(),
        )
    }

    pub fn with_url(
        url: impl Into<String>,
        auth_token: Option<&str>,
        connect_timeout: Duration,
    ) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(1)
            .build()
            .map_err(|e| StreamError::Config(format!("failed to create HTTP client: {e}")))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(
            reqwest::header::CACHE_CONTROL,
            reqwest::header::HeaderValue::from_static("no-cache"),
        );
        if let Some(token) = auth_token {
            let value = format!("Bearer {token}")
                .parse::<reqwest::header::HeaderValue>()
                .map_err(|e| StreamError::Config(format!("invalid auth header: {e}")))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        Ok(Self {
            client,
            url: url.into(),
            headers,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StreamConnector for HttpStreamConnector {
    async fn connect(&self) -> Result<MessageStream, StreamError> {
        let response = self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| StreamError::Connection(format!("failed to open push stream: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = Box::pin(response.bytes_stream());
        let messages = stream::unfold(
            (bytes, SseDecoder::new(), Vec::<String>::new().into_iter(), false),
            |(mut bytes, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(data) = pending.next() {
                        return Some((Ok(data), (bytes, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            pending = message_data(decoder.push(&chunk)).into_iter();
                        }
                        Some(Err(e)) => {
                            done = true;
                            let error = StreamError::Stream(e.to_string());
                            return Some((Err(error), (bytes, decoder, pending, done)));
                        }
                        None => {
                            done = true;
                            pending = message_data(decoder.finish()).into_iter();
                        }
                    }
                }
            },
        );

        Ok(Box::pin(messages))
    }
}

fn message_data(events: impl IntoIterator<Item = super::sse::SseEvent>) -> Vec<String> {
    events
        .into_iter()
        .filter(|event| event.event_type == "message")
        .map(|event| event.data)
        .collect()
}

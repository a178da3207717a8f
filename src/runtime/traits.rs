//! Trait abstractions for runtime I/O
//!
//! The relay call sits behind a trait so the executor can be tested with mocks.

use crate::api::{RelayReply, RelayRequest};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Ways a relay call can fail
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayClientError {
    #[error("Relay unreachable: {0}")]
    Transport(String),
    #[error("Relay returned HTTP {0}")]
    Status(u16),
    #[error("Malformed relay reply: {0}")]
    Malformed(String),
}

/// Client for the relay endpoint
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Send one utterance, get the bot reply
    async fn chat(&self, message: &str) -> Result<String, RelayClientError>;
}

#[async_trait]
impl<T: RelayClient + ?Sized> RelayClient for Arc<T> {
    async fn chat(&self, message: &str) -> Result<String, RelayClientError> {
        (**self).chat(message).await
    }
}

// ============================================================================
// Production Adapter
// ============================================================================

const RELAY_TIMEOUT: Duration = Duration::from_secs(60);

/// Relay client over HTTP (`POST {base}/chat`)
pub struct HttpRelayClient {
    client: Client,
    chat_url: String,
}

impl HttpRelayClient {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, RelayClientError> {
        let client = Client::builder()
            .timeout(RELAY_TIMEOUT)
            .build()
            .map_err(|e| {
                RelayClientError::Transport(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            chat_url: format!("{}/chat", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn chat(&self, message: &str) -> Result<String, RelayClientError> {
        let request = RelayRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayClientError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayClientError::Transport(format!("Failed to read response: {e}")))?;

        let reply: RelayReply =
            serde_json::from_str(&body).map_err(|e| RelayClientError::Malformed(e.to_string()))?;
        Ok(reply.reply)
    }
}

//! REST webhook dialogue service
//!
//! Talks to a Rasa-style REST channel: POST `{sender, message}`, receive a JSON
//! array of `{text, ...}` objects.

use super::{DialogueError, DialogueRequest, DialogueService, Fragment};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Upstream body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Dialogue service reached over HTTP
pub struct RestDialogueService {
    client: Client,
    url: String,
}

impl RestDialogueService {
    /// Build a service for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed (TLS backend init).
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DialogueError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DialogueError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> DialogueError {
        DialogueError::status(
            status.as_u16(),
            format!("HTTP {status}: {}", truncate_body(body)),
        )
    }
}

#[async_trait]
impl DialogueService for RestDialogueService {
    async fn send(&self, request: &DialogueRequest) -> Result<Vec<Fragment>, DialogueError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DialogueError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    DialogueError::network(format!("Connection failed: {e}"))
                } else {
                    DialogueError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DialogueError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        serde_json::from_str::<Vec<Fragment>>(&body).map_err(|e| {
            DialogueError::malformed(format!(
                "Failed to parse response: {e} - body: {}",
                truncate_body(&body)
            ))
        })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{head}... ({} bytes total)", body.len())
}

//! Dialogue service abstraction
//!
//! Forwards one utterance to the external dialogue service and normalizes the
//! reply fragments into a single string.

mod error;
mod gateway;
mod rest;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{DialogueError, DialogueErrorKind};
pub use gateway::{DialogueConfig, DialogueGateway};
pub use rest::RestDialogueService;
pub use types::{DialogueRequest, Fragment};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the external dialogue service
#[async_trait]
pub trait DialogueService: Send + Sync {
    /// Send one request and return the reply fragments in the order received
    async fn send(&self, request: &DialogueRequest) -> Result<Vec<Fragment>, DialogueError>;

    /// Endpoint this service talks to (for logging)
    fn endpoint(&self) -> &str;
}

/// Logging wrapper for dialogue services
pub struct LoggingService {
    inner: Arc<dyn DialogueService>,
    endpoint: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn DialogueService>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl DialogueService for LoggingService {
    async fn send(&self, request: &DialogueRequest) -> Result<Vec<Fragment>, DialogueError> {
        let start = std::time::Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(fragments) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    fragments = fragments.len(),
                    "Dialogue request completed"
                );
            }
            // The relay handler reports the failure itself
            Err(e) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    "Dialogue request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<T: DialogueService + ?Sized> DialogueService for Arc<T> {
    async fn send(&self, request: &DialogueRequest) -> Result<Vec<Fragment>, DialogueError> {
        (**self).send(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

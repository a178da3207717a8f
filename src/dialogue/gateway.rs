//! Gateway that turns one utterance into one reply string

use super::types::join_fragments;
use super::{DialogueError, DialogueRequest, DialogueService, LoggingService, RestDialogueService};
use std::sync::Arc;
use std::time::Duration;

/// Default Rasa REST channel endpoint
pub const DEFAULT_DIALOGUE_URL: &str = "http://localhost:5005/webhooks/rest/webhook";

/// Sender identifier attached to every forwarded utterance
pub const DEFAULT_SENDER: &str = "user";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the outbound dialogue service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueConfig {
    pub url: String,
    pub sender: String,
    pub timeout: Duration,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DIALOGUE_URL.to_string(),
            sender: DEFAULT_SENDER.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DialogueConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup("DIALOGUE_URL").unwrap_or(defaults.url),
            sender: lookup("DIALOGUE_SENDER").unwrap_or(defaults.sender),
            timeout: lookup("DIALOGUE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }
}

/// Stateless adapter in front of the dialogue service
///
/// Issues exactly one upstream call per `forward` and never retries.
pub struct DialogueGateway {
    service: Arc<dyn DialogueService>,
    sender: String,
}

impl DialogueGateway {
    pub fn new(service: Arc<dyn DialogueService>, sender: impl Into<String>) -> Self {
        Self {
            service,
            sender: sender.into(),
        }
    }

    /// Build the production gateway: REST service wrapped in request logging.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn from_config(config: &DialogueConfig) -> Result<Self, DialogueError> {
        let rest = RestDialogueService::new(&config.url, config.timeout)?;
        let logged = LoggingService::new(Arc::new(rest));
        Ok(Self::new(Arc::new(logged), &config.sender))
    }

    pub fn endpoint(&self) -> &str {
        self.service.endpoint()
    }

    /// Forward one utterance and join the reply fragments with single spaces.
    ///
    /// Zero fragments is a valid reply and yields an empty string.
    ///
    /// # Errors
    ///
    /// Any transport, status or parse failure from the service.
    pub async fn forward(&self, utterance: &str) -> Result<String, DialogueError> {
        let request = DialogueRequest::new(&self.sender, utterance);
        let fragments = self.service.send(&request).await?;
        Ok(join_fragments(&fragments))
    }
}

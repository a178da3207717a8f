//! Session phase and configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sequence number of an exchange within one session, starting at 1
pub type ExchangeId = u64;

/// Where the session is in the current exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Ready for user input
    #[default]
    Idle,

    /// User message appended, waiting out the compose delay
    Sending {
        exchange: ExchangeId,
        utterance: String,
    },

    /// Typing affordance shown; relay call pending or in flight
    TypingIndicator {
        exchange: ExchangeId,
        utterance: String,
        /// Set once the relay call has been issued
        #[serde(default)]
        request_sent: bool,
    },

    /// Bot reply appended; momentary, re-arms to Idle
    Resolved { exchange: ExchangeId },

    /// Relay call failed; momentary, re-arms to Idle
    Failed {
        exchange: ExchangeId,
        message: String,
    },
}

impl Phase {
    /// Whether a new user send is accepted in this phase
    pub fn accepts_send(&self) -> bool {
        matches!(
            self,
            Phase::Idle | Phase::Resolved { .. } | Phase::Failed { .. }
        )
    }

    /// Whether an exchange is in flight
    pub fn is_busy(&self) -> bool {
        !self.accepts_send()
    }

    /// Short name used in logs and rendering
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Sending { .. } => "sending",
            Phase::TypingIndicator { .. } => "typing_indicator",
            Phase::Resolved { .. } => "resolved",
            Phase::Failed { .. } => "failed",
        }
    }
}

/// What to do with an empty bot reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmptyReplyPolicy {
    /// Append the empty reply as-is
    #[default]
    Keep,
    /// Replace an empty reply with this text
    Fallback(String),
}

impl EmptyReplyPolicy {
    pub fn apply(&self, reply: String) -> String {
        match self {
            EmptyReplyPolicy::Fallback(text) if reply.is_empty() => text.clone(),
            _ => reply,
        }
    }
}

/// Default length of one simulated-latency time unit
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Context for a session (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    /// Delay from entering Sending to showing the typing indicator
    pub typing_delay: Duration,
    /// Delay from showing the typing indicator to issuing the relay call
    pub reply_delay: Duration,
    pub empty_reply: EmptyReplyPolicy,
}

impl SessionContext {
    /// Context with the standard 1-unit typing delay and 2-unit reply delay
    pub fn new(session_id: impl Into<String>, time_unit: Duration) -> Self {
        Self {
            session_id: session_id.into(),
            typing_delay: time_unit,
            reply_delay: time_unit * 2,
            empty_reply: EmptyReplyPolicy::Keep,
        }
    }

    #[must_use]
    pub fn with_empty_reply(mut self, policy: EmptyReplyPolicy) -> Self {
        self.empty_reply = policy;
        self
    }
}

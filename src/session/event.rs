//! Events that can occur in a session

use super::state::ExchangeId;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// Send action with the draft as it stood; `exchange` is the number the
    /// new exchange will get if accepted
    UserSend {
        text: String,
        exchange: ExchangeId,
    },

    // Timer events
    TypingDelayElapsed {
        exchange: ExchangeId,
    },
    ReplyDelayElapsed {
        exchange: ExchangeId,
    },

    // Relay events
    RelayReplied {
        exchange: ExchangeId,
        reply: String,
    },
    RelayFailed {
        exchange: ExchangeId,
        message: String,
    },

    /// Momentary Resolved/Failed falls back to Idle
    Rearm,
}

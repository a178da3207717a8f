//! Effects produced by state transitions

use super::message::Sender;
use super::state::ExchangeId;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stamp and append a message to the transcript
    AppendMessage {
        sender: Sender,
        text: String,
    },

    /// Empty the draft
    ClearDraft,

    /// Publish the new phase to observers
    NotifyPhase,

    /// Fire `TypingDelayElapsed` after `delay`
    ScheduleTypingIndicator {
        delay: Duration,
        exchange: ExchangeId,
    },

    /// Fire `ReplyDelayElapsed` after `delay`
    ScheduleRelayRequest {
        delay: Duration,
        exchange: ExchangeId,
    },

    /// Call the relay (spawns as background task)
    RequestRelay {
        exchange: ExchangeId,
        utterance: String,
    },

    /// Transient, non-blocking failure notice for the UI
    NotifyFailure { message: String },

    /// Feed `Event::Rearm` back in immediately
    Rearm,
}

impl Effect {
    pub fn append_user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn append_bot_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

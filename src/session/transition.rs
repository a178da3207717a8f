//! Pure state transition function
//!
//! Given the same phase, context and event it always produces the same result;
//! no clocks, no I/O. Timestamps are assigned by the runtime when it executes
//! `AppendMessage`.

use super::{Effect, Event, Phase, SessionContext};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Phase,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Phase) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
///
/// None of these are user-facing: the runtime drops the event and leaves the
/// session untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("An exchange is already in flight")]
    SessionBusy,
    #[error("Draft is empty")]
    EmptyDraft,
    #[error("Stale event for exchange {exchange} in phase {phase}")]
    StaleEvent { exchange: u64, phase: &'static str },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per edge of the phase graph
pub fn transition(
    state: &Phase,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User send
        // ============================================================

        // Busy + UserSend -> Reject (at most one exchange in flight)
        (Phase::Sending { .. } | Phase::TypingIndicator { .. }, Event::UserSend { .. }) => {
            Err(TransitionError::SessionBusy)
        }

        (_, Event::UserSend { text, .. }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyDraft)
        }

        // Idle (or momentary Resolved/Failed) + UserSend -> Sending
        (
            Phase::Idle | Phase::Resolved { .. } | Phase::Failed { .. },
            Event::UserSend { text, exchange },
        ) => Ok(TransitionResult::new(Phase::Sending {
            exchange,
            utterance: text.clone(),
        })
        .with_effect(Effect::append_user_message(text))
        .with_effect(Effect::ClearDraft)
        .with_effect(Effect::NotifyPhase)
        .with_effect(Effect::ScheduleTypingIndicator {
            delay: context.typing_delay,
            exchange,
        })),

        // ============================================================
        // Simulated latency
        // ============================================================

        // Sending + TypingDelayElapsed -> TypingIndicator
        (
            Phase::Sending {
                exchange,
                utterance,
            },
            Event::TypingDelayElapsed {
                exchange: timer_exchange,
            },
        ) if *exchange == timer_exchange => Ok(TransitionResult::new(Phase::TypingIndicator {
            exchange: *exchange,
            utterance: utterance.clone(),
            request_sent: false,
        })
        .with_effect(Effect::NotifyPhase)
        .with_effect(Effect::ScheduleRelayRequest {
            delay: context.reply_delay,
            exchange: *exchange,
        })),

        // TypingIndicator + ReplyDelayElapsed -> issue the relay call once
        (
            Phase::TypingIndicator {
                exchange,
                utterance,
                request_sent: false,
            },
            Event::ReplyDelayElapsed {
                exchange: timer_exchange,
            },
        ) if *exchange == timer_exchange => Ok(TransitionResult::new(Phase::TypingIndicator {
            exchange: *exchange,
            utterance: utterance.clone(),
            request_sent: true,
        })
        .with_effect(Effect::RequestRelay {
            exchange: *exchange,
            utterance: utterance.clone(),
        })),

        // ============================================================
        // Relay outcome
        // ============================================================

        // TypingIndicator + RelayReplied -> Resolved -> (Rearm) Idle
        (
            Phase::TypingIndicator {
                exchange,
                request_sent: true,
                ..
            },
            Event::RelayReplied {
                exchange: reply_exchange,
                reply,
            },
        ) if *exchange == reply_exchange => Ok(TransitionResult::new(Phase::Resolved {
            exchange: *exchange,
        })
        .with_effect(Effect::append_bot_message(context.empty_reply.apply(reply)))
        .with_effect(Effect::NotifyPhase)
        .with_effect(Effect::Rearm)),

        // TypingIndicator + RelayFailed -> Failed -> (Rearm) Idle; no bot message
        (
            Phase::TypingIndicator {
                exchange,
                request_sent: true,
                ..
            },
            Event::RelayFailed {
                exchange: reply_exchange,
                message,
            },
        ) if *exchange == reply_exchange => Ok(TransitionResult::new(Phase::Failed {
            exchange: *exchange,
            message: message.clone(),
        })
        .with_effect(Effect::NotifyPhase)
        .with_effect(Effect::NotifyFailure { message })
        .with_effect(Effect::Rearm)),

        // ============================================================
        // Re-arm
        // ============================================================
        (Phase::Resolved { .. } | Phase::Failed { .. }, Event::Rearm) => {
            Ok(TransitionResult::new(Phase::Idle).with_effect(Effect::NotifyPhase))
        }

        // ============================================================
        // Stale / invalid
        // ============================================================
        (
            state,
            Event::TypingDelayElapsed { exchange }
            | Event::ReplyDelayElapsed { exchange }
            | Event::RelayReplied { exchange, .. }
            | Event::RelayFailed { exchange, .. },
        ) => Err(TransitionError::StaleEvent {
            exchange,
            phase: state.name(),
        }),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

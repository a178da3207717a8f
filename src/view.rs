//! Plain-text rendering of a session
//!
//! Presentation only: takes snapshots and events, never touches session state.

use crate::runtime::{SessionEvent, SessionSnapshot};
use crate::session::{Message, Phase, Sender};
use std::fmt::Write;

/// Line shown while the bot reply is pending
pub const TYPING_INDICATOR: &str = "bot is typing...";

/// `sender: text`
pub fn render_message(message: &Message) -> String {
    format!("{}: {}", message.sender.as_str(), message.text)
}

/// Every message in order, one per line, plus the typing indicator when shown
pub fn render_transcript(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    for message in snapshot.transcript.messages() {
        let _ = writeln!(out, "{}", render_message(message));
    }
    if shows_typing_indicator(&snapshot.phase) {
        let _ = writeln!(out, "{TYPING_INDICATOR}");
    }
    out
}

pub fn shows_typing_indicator(phase: &Phase) -> bool {
    matches!(phase, Phase::TypingIndicator { .. })
}

/// Incremental rendering for a live terminal.
///
/// User messages are not echoed (the user just typed them). Returns `None`
/// for events with nothing to show.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended { message } if message.sender == Sender::Bot => {
            Some(render_message(message))
        }
        SessionEvent::PhaseChanged { phase } if shows_typing_indicator(phase) => {
            Some(TYPING_INDICATOR.to_string())
        }
        SessionEvent::Failure { message } => Some(format!("(message not delivered: {message})")),
        _ => None,
    }
}

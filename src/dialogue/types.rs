//! Wire types for the dialogue service

use serde::{Deserialize, Serialize};

/// Request body sent to the dialogue service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub sender: String,
    pub message: String,
}

impl DialogueRequest {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
        }
    }
}

/// One reply unit from the dialogue service
///
/// Only `text` is read; any other keys the service sends are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Join fragment texts in order with single spaces
pub fn join_fragments(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

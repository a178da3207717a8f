//! Dialogue service error types

use thiserror::Error;

/// Dialogue service failure with classification
///
/// Every failure mode collapses into this one type; the kind only exists so
/// the relay can log what went wrong.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DialogueError {
    pub kind: DialogueErrorKind,
    pub message: String,
}

impl DialogueError {
    pub fn new(kind: DialogueErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Network, message)
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Status(status), message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(DialogueErrorKind::Malformed, message)
    }
}

/// What went wrong talking to the dialogue service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueErrorKind {
    /// Connection refused, timeout, body read failure
    Network,
    /// Service answered with a non-success HTTP status
    Status(u16),
    /// Body was not a list of fragments
    Malformed,
}

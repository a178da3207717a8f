//! Chat relay - forwards chat messages to a dialogue service
//!
//! The relay server exposes `POST /chat` in front of a Rasa-style dialogue
//! service. The client side drives a conversation session as an explicit
//! state machine with simulated typing latency.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod api;
pub mod dialogue;
pub mod runtime;
pub mod session;
pub mod view;

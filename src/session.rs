//! Conversation session state machine
//!
//! Elm-style: a pure transition function maps `(phase, event)` to a new phase
//! plus effects. The runtime executes effects (timers, relay calls, transcript
//! appends) and feeds the results back in as events.

mod effect;
pub mod event;
mod message;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use message::{Message, Sender, Transcript};
pub use state::{EmptyReplyPolicy, ExchangeId, Phase, SessionContext};
pub use transition::{transition, TransitionError, TransitionResult};

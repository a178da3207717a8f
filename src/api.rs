//! HTTP relay endpoint
//!
//! Exposes the dialogue gateway as `POST /chat`. Stateless: no sessions, no
//! authentication, no rate limiting, no retries.

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::dialogue::DialogueGateway;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<DialogueGateway>,
}

impl AppState {
    pub fn new(gateway: DialogueGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

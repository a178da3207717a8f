//! Runtime for driving a conversation session
//!
//! One task owns the session (single writer). Observers get a `broadcast`
//! stream of [`SessionEvent`]s and a `watch` of the latest [`SessionSnapshot`].

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::session::{EmptyReplyPolicy, Message, Phase, SessionContext, Transcript};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Default relay base URL
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3001";

/// Configuration for the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub relay_url: String,
    pub time_unit: Duration,
    pub empty_reply: EmptyReplyPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            time_unit: crate::session::state::DEFAULT_TIME_UNIT,
            empty_reply: EmptyReplyPolicy::Keep,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            relay_url: lookup("CHAT_RELAY_URL").unwrap_or(defaults.relay_url),
            time_unit: lookup("CHAT_TIME_UNIT_MS")
                .and_then(|s| s.parse().ok())
                .map_or(defaults.time_unit, Duration::from_millis),
            empty_reply: lookup("CHAT_EMPTY_REPLY_FALLBACK")
                .map_or(defaults.empty_reply, EmptyReplyPolicy::Fallback),
        }
    }

    /// Session context for a fresh session
    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(uuid::Uuid::new_v4().to_string(), self.time_unit)
            .with_empty_reply(self.empty_reply.clone())
    }
}

/// Events sent to session observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MessageAppended {
        message: Message,
    },
    PhaseChanged { phase: Phase },
    /// Transient notice that an exchange failed; the user message stays
    Failure { message: String },
}

/// Read-only copy of the session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub transcript: Transcript,
    pub draft: String,
}

/// Input from the UI side
#[derive(Debug)]
pub enum Command {
    SetDraft(String),
    Send,
    /// Acknowledged once every earlier command has been handled
    Barrier(oneshot::Sender<()>),
}

/// The session runtime has stopped
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Session is closed")]
pub struct SessionClosed;

/// Handle to interact with a running session
///
/// Dropping the handle tears the session down, same as [`SessionHandle::shutdown`].
pub struct SessionHandle {
    session_id: String,
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl SessionHandle {
    /// Start a session runtime on the current tokio runtime
    pub fn spawn<R: RelayClient + 'static>(context: SessionContext, relay: R) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let shutdown = CancellationToken::new();
        let session_id = context.session_id.clone();

        let runtime = SessionRuntime::new(
            context,
            relay,
            command_rx,
            broadcast_tx.clone(),
            snapshot_tx,
            shutdown.clone(),
        );
        let task = tokio::spawn(runtime.run());

        Self {
            session_id,
            command_tx,
            broadcast_tx,
            snapshot_rx,
            _guard: shutdown.clone().drop_guard(),
            shutdown,
            task,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Replace the draft text.
    ///
    /// # Errors
    ///
    /// [`SessionClosed`] if the runtime has stopped.
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.command(Command::SetDraft(text.into())).await
    }

    /// User send action with the current draft. Ignored while an exchange is
    /// in flight or when the draft is blank.
    ///
    /// # Errors
    ///
    /// [`SessionClosed`] if the runtime has stopped.
    pub async fn send(&self) -> Result<(), SessionClosed> {
        self.command(Command::Send).await
    }

    /// Set the draft and send it.
    ///
    /// # Errors
    ///
    /// [`SessionClosed`] if the runtime has stopped.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.set_draft(text).await?;
        self.send().await
    }

    /// Wait until every command sent so far has been handled and no exchange
    /// is in flight.
    ///
    /// # Errors
    ///
    /// [`SessionClosed`] if the runtime stops first.
    pub async fn settle(&self) -> Result<(), SessionClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.command(Command::Barrier(ack_tx)).await?;
        ack_rx.await.map_err(|_| SessionClosed)?;

        let mut snapshots = self.snapshot_rx.clone();
        snapshots
            .wait_for(|s| !s.phase.is_busy())
            .await
            .map(|_| ())
            .map_err(|_| SessionClosed)
    }

    async fn command(&self, command: Command) -> Result<(), SessionClosed> {
        self.command_tx.send(command).await.map_err(|_| SessionClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Cancel pending timers and any in-flight relay call, then wait for the
    /// runtime to stop. No state changes after this returns.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(session_id = %self.session_id, error = %e, "Session task failed");
        }
    }
}

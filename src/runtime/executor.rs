//! Session runtime executor

use super::traits::RelayClient;
use super::{Command, SessionEvent, SessionSnapshot};

use crate::session::{
    transition, Effect, Event, ExchangeId, Phase, SessionContext, Transcript, TransitionError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns the session state and executes effects produced by [`transition`]
pub struct SessionRuntime<R: RelayClient + 'static> {
    context: SessionContext,
    phase: Phase,
    transcript: Transcript,
    draft: String,
    /// Number of the most recently started exchange
    last_exchange: ExchangeId,
    relay: Arc<R>,
    command_rx: mpsc::Receiver<Command>,
    /// Timer and relay completions
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    /// Cancelled when the session is torn down
    shutdown: CancellationToken,
    /// Child of `shutdown`, scoped to the current exchange's timers and call
    exchange_token: Option<CancellationToken>,
}

impl<R: RelayClient + 'static> SessionRuntime<R> {
    pub fn new(
        context: SessionContext,
        relay: R,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        shutdown: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            context,
            phase: Phase::Idle,
            transcript: Transcript::new(),
            draft: String::new(),
            last_exchange: 0,
            relay: Arc::new(relay),
            command_rx,
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
            shutdown,
            exchange_token: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                Some(command) = self.command_rx.recv() => self.handle_command(command),

                Some(event) = self.event_rx.recv() => self.process_event(event),

                else => break,
            }
        }

        if let Some(token) = self.exchange_token.take() {
            token.cancel();
        }
        tracing::info!(
            session_id = %self.context.session_id,
            messages = self.transcript.len(),
            "Session runtime stopped"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetDraft(text) => {
                self.draft = text;
                self.publish_snapshot();
            }
            Command::Send => {
                let event = Event::UserSend {
                    text: self.draft.clone(),
                    exchange: self.last_exchange + 1,
                };
                self.process_event(event);
            }
            Command::Barrier(ack) => {
                let _ = ack.send(());
            }
        }
    }

    fn process_event(&mut self, event: Event) {
        // Chained events (re-arm) are processed in the same step
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&self.phase, &self.context, current_event) {
                Ok(r) => r,
                Err(e @ (TransitionError::SessionBusy | TransitionError::EmptyDraft)) => {
                    // Double submit or empty input: not a real failure
                    tracing::debug!(
                        session_id = %self.context.session_id,
                        reason = %e,
                        "Ignoring send"
                    );
                    return;
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %self.context.session_id,
                        error = %e,
                        "Dropping event"
                    );
                    return;
                }
            };

            let old_phase = std::mem::replace(&mut self.phase, result.new_state);
            tracing::debug!(
                session_id = %self.context.session_id,
                from = old_phase.name(),
                to = self.phase.name(),
                "Phase transition"
            );

            if let Phase::Sending { exchange, .. } = self.phase {
                self.start_exchange(exchange);
            }

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }

            self.publish_snapshot();
        }
    }

    /// New exchange: fresh cancellation scope for its timers and relay call
    fn start_exchange(&mut self, exchange: ExchangeId) {
        self.last_exchange = exchange;
        if let Some(previous) = self.exchange_token.replace(self.shutdown.child_token()) {
            previous.cancel();
        }
    }

    fn exchange_token(&self) -> CancellationToken {
        self.exchange_token
            .clone()
            .unwrap_or_else(|| self.shutdown.child_token())
    }

    /// Execute an effect and optionally return a generated event
    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AppendMessage { sender, text } => {
                let message = self.transcript.append(sender, text).clone();
                let _ = self
                    .broadcast_tx
                    .send(SessionEvent::MessageAppended { message });
                None
            }

            Effect::ClearDraft => {
                self.draft.clear();
                None
            }

            Effect::NotifyPhase => {
                let _ = self.broadcast_tx.send(SessionEvent::PhaseChanged {
                    phase: self.phase.clone(),
                });
                None
            }

            Effect::ScheduleTypingIndicator { delay, exchange } => {
                self.schedule(delay, Event::TypingDelayElapsed { exchange });
                None
            }

            Effect::ScheduleRelayRequest { delay, exchange } => {
                self.schedule(delay, Event::ReplyDelayElapsed { exchange });
                None
            }

            Effect::RequestRelay {
                exchange,
                utterance,
            } => {
                let cancel_token = self.exchange_token();
                let relay = self.relay.clone();
                let event_tx = self.event_tx.clone();
                let session_id = self.context.session_id.clone();

                tokio::spawn(async move {
                    tracing::info!(%session_id, exchange, "Requesting reply from relay");

                    // Race relay call against teardown
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::debug!(%session_id, exchange, "Relay request cancelled");
                        }

                        result = relay.chat(&utterance) => {
                            let event = match result {
                                Ok(reply) => Event::RelayReplied { exchange, reply },
                                Err(e) => Event::RelayFailed {
                                    exchange,
                                    message: e.to_string(),
                                },
                            };
                            let _ = event_tx.send(event).await;
                        }
                    }
                });
                None
            }

            Effect::NotifyFailure { message } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    error = %message,
                    "Exchange failed"
                );
                let _ = self.broadcast_tx.send(SessionEvent::Failure { message });
                None
            }

            Effect::Rearm => Some(Event::Rearm),
        }
    }

    /// Fire `event` after `delay` unless the exchange is cancelled first
    fn schedule(&self, delay: Duration, event: Event) {
        let cancel_token = self.exchange_token();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {}

                () = tokio::time::sleep(delay) => {
                    let _ = event_tx.send(event).await;
                }
            }
        });
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(SessionSnapshot {
            phase: self.phase.clone(),
            transcript: self.transcript.clone(),
            draft: self.draft.clone(),
        });
    }
}

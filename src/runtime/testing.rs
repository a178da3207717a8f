//! Mock implementations for testing
//!
//! These mocks enable session tests without a real relay.

use super::traits::{RelayClient, RelayClientError};
use super::{SessionClosed, SessionEvent, SessionHandle, SessionSnapshot};
use crate::session::{EmptyReplyPolicy, SessionContext};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Relay Client
// ============================================================================

/// Mock relay client that returns queued replies
pub struct MockRelayClient {
    replies: Mutex<VecDeque<Result<String, RelayClientError>>>,
    /// Record of all messages sent
    pub requests: Mutex<Vec<String>>,
}

impl MockRelayClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: RelayClientError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<String, RelayClientError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RelayClientError::Transport(
                    "No mock reply queued".to_string(),
                ))
            })
    }
}

impl Default for MockRelayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayClient for MockRelayClient {
    async fn chat(&self, message: &str) -> Result<String, RelayClientError> {
        self.requests.lock().unwrap().push(message.to_string());
        self.next_reply()
    }
}

// ============================================================================
// Delayed Mock Relay Client (for cancellation testing)
// ============================================================================

/// Mock relay client with configurable delay
pub struct DelayedMockRelayClient {
    inner: MockRelayClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockRelayClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockRelayClient::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.queue_reply(reply);
    }

    pub fn recorded_requests(&self) -> Vec<String> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl RelayClient for DelayedMockRelayClient {
    async fn chat(&self, message: &str) -> Result<String, RelayClientError> {
        self.inner
            .requests
            .lock()
            .unwrap()
            .push(message.to_string());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }
}

// ============================================================================
// Test Session Builder
// ============================================================================

/// Time unit used by test sessions: exchange takes ~3 units
pub const TEST_TIME_UNIT: Duration = Duration::from_millis(10);

/// Helper for building test sessions with minimal boilerplate
pub struct TestSession<R: RelayClient + 'static> {
    pub handle: SessionHandle,
    pub events: broadcast::Receiver<SessionEvent>,
    pub relay: Arc<R>,
}

impl TestSession<MockRelayClient> {
    /// Create a test session builder with an instant mock relay
    pub fn new() -> TestSessionBuilder<MockRelayClient> {
        TestSessionBuilder::new()
    }
}

pub struct TestSessionBuilder<R> {
    relay: R,
    time_unit: Duration,
    empty_reply: EmptyReplyPolicy,
}

impl<R: RelayClient + 'static> TestSessionBuilder<R> {
    pub fn relay<R2: RelayClient + 'static>(self, relay: R2) -> TestSessionBuilder<R2> {
        TestSessionBuilder {
            relay,
            time_unit: self.time_unit,
            empty_reply: self.empty_reply,
        }
    }

    pub fn time_unit(mut self, time_unit: Duration) -> Self {
        self.time_unit = time_unit;
        self
    }

    pub fn empty_reply(mut self, policy: EmptyReplyPolicy) -> Self {
        self.empty_reply = policy;
        self
    }

    pub fn build(self) -> TestSession<R> {
        let relay = Arc::new(self.relay);
        let context = SessionContext::new("test-session", self.time_unit)
            .with_empty_reply(self.empty_reply);
        let handle = SessionHandle::spawn(context, relay.clone());
        let events = handle.subscribe();
        TestSession {
            handle,
            events,
            relay,
        }
    }
}

impl TestSessionBuilder<MockRelayClient> {
    pub fn new() -> Self {
        Self {
            relay: MockRelayClient::new(),
            time_unit: TEST_TIME_UNIT,
            empty_reply: EmptyReplyPolicy::Keep,
        }
    }
}

impl Default for TestSessionBuilder<MockRelayClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RelayClient + 'static> TestSession<R> {
    /// Wait for an event matching `predicate`, returning it
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        predicate: impl Fn(&SessionEvent) -> bool,
    ) -> Option<SessionEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.events.recv()).await {
                Ok(Ok(event)) if predicate(&event) => return Some(event),
                _ => continue,
            }
        }
        None
    }

    /// Wait for the phase with the given name
    pub async fn wait_for_phase(&mut self, name: &str, timeout: Duration) -> bool {
        self.wait_for(timeout, |e| {
            matches!(e, SessionEvent::PhaseChanged { phase } if phase.name() == name)
        })
        .await
        .is_some()
    }

    /// Wait until `count` exchanges have returned to Idle
    pub async fn wait_for_exchanges(&mut self, count: usize, timeout: Duration) -> bool {
        for _ in 0..count {
            if !self.wait_for_phase("idle", timeout).await {
                return false;
            }
        }
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot()
    }

    pub fn transcript_texts(&self) -> Vec<(String, String)> {
        self.snapshot()
            .transcript
            .messages()
            .iter()
            .map(|m| (m.sender.as_str().to_string(), m.text.clone()))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Phase;

    const WAIT: Duration = Duration::from_secs(2);

    fn pair(sender: &str, text: &str) -> (String, String) {
        (sender.to_string(), text.to_string())
    }

    #[tokio::test]
    async fn test_mock_relay_client() {
        let mock = MockRelayClient::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.chat("hi").await.unwrap(), "Hello");
        // Second call should fail (no more replies)
        assert!(mock.chat("hi").await.is_err());
        assert_eq!(mock.recorded_requests(), vec!["hi", "hi"]);
    }

    /// Integration test: one successful exchange
    #[tokio::test]
    async fn test_simple_exchange() {
        let relay = MockRelayClient::new();
        relay.queue_reply("Hi there");

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("hello").await.unwrap();

        assert!(s.wait_for_exchanges(1, WAIT).await);

        assert_eq!(
            s.transcript_texts(),
            vec![pair("user", "hello"), pair("bot", "Hi there")]
        );
        assert_eq!(s.relay.recorded_requests(), vec!["hello"]);
        let snapshot = s.snapshot();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.draft, "");
    }

    #[tokio::test]
    async fn test_phases_in_order() {
        let relay = MockRelayClient::new();
        relay.queue_reply("ok");

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("hello").await.unwrap();

        let mut phases = Vec::new();
        while phases.last() != Some(&"idle") {
            match s
                .wait_for(WAIT, |e| matches!(e, SessionEvent::PhaseChanged { .. }))
                .await
            {
                Some(SessionEvent::PhaseChanged { phase }) => phases.push(phase.name()),
                _ => panic!("Timed out, saw {phases:?}"),
            }
        }

        assert_eq!(phases, vec!["sending", "typing_indicator", "resolved", "idle"]);
    }

    #[tokio::test]
    async fn test_typing_indicator_precedes_relay_call() {
        let relay = MockRelayClient::new();
        relay.queue_reply("ok");

        let mut s = TestSession::new()
            .relay(relay)
            .time_unit(Duration::from_millis(100))
            .build();
        s.handle.submit("hello").await.unwrap();

        assert!(s.wait_for_phase("typing_indicator", WAIT).await);
        // Reply delay (2 units) has not elapsed yet
        assert!(s.relay.recorded_requests().is_empty());
        assert_eq!(s.snapshot().transcript.len(), 1);

        assert!(s.wait_for_exchanges(1, WAIT).await);
        assert_eq!(s.relay.recorded_requests(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_sequential_exchanges_stay_ordered() {
        let relay = MockRelayClient::new();
        for reply in ["r1", "r2", "r3"] {
            relay.queue_reply(reply);
        }

        let mut s = TestSession::new().relay(relay).build();
        for text in ["m1", "m2", "m3"] {
            s.handle.submit(text).await.unwrap();
            assert!(s.wait_for_exchanges(1, WAIT).await);
        }

        assert_eq!(
            s.transcript_texts(),
            vec![
                pair("user", "m1"),
                pair("bot", "r1"),
                pair("user", "m2"),
                pair("bot", "r2"),
                pair("user", "m3"),
                pair("bot", "r3"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message() {
        let relay = MockRelayClient::new();
        relay.queue_error(RelayClientError::Status(500));

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("hello").await.unwrap();

        let failure = s
            .wait_for(WAIT, |e| matches!(e, SessionEvent::Failure { .. }))
            .await;
        assert!(matches!(failure, Some(SessionEvent::Failure { .. })));
        assert!(s.wait_for_phase("idle", WAIT).await);

        assert_eq!(s.transcript_texts(), vec![pair("user", "hello")]);
        assert_eq!(s.snapshot().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_recovers_after_failure() {
        let relay = MockRelayClient::new();
        relay.queue_error(RelayClientError::Transport("refused".to_string()));
        relay.queue_reply("back online");

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("first").await.unwrap();
        assert!(s.wait_for_exchanges(1, WAIT).await);
        s.handle.submit("second").await.unwrap();
        assert!(s.wait_for_exchanges(1, WAIT).await);

        assert_eq!(
            s.transcript_texts(),
            vec![
                pair("user", "first"),
                pair("user", "second"),
                pair("bot", "back online"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_draft_is_noop() {
        let mut s = TestSession::new().build();
        s.handle.send().await.unwrap();
        s.handle.submit("   ").await.unwrap();

        // Nothing should happen within a full exchange's worth of time
        let event = s.wait_for(TEST_TIME_UNIT * 10, |_| true).await;
        assert!(event.is_none());

        let snapshot = s.snapshot();
        assert!(snapshot.transcript.is_empty());
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.draft, "   ");
        assert!(s.relay.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_rapid_second_send_dropped() {
        let relay = MockRelayClient::new();
        relay.queue_reply("reply to a");
        relay.queue_reply("reply to b");

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("a").await.unwrap();
        s.handle.submit("b").await.unwrap();

        assert!(s.wait_for_exchanges(1, WAIT).await);
        // Give a dropped send time to misbehave if it were going to
        tokio::time::sleep(TEST_TIME_UNIT * 5).await;

        assert_eq!(
            s.transcript_texts(),
            vec![pair("user", "a"), pair("bot", "reply to a")]
        );
        assert_eq!(s.relay.recorded_requests(), vec!["a"]);
        // The ignored send leaves its draft in place
        assert_eq!(s.snapshot().draft, "b");
    }

    #[tokio::test]
    async fn test_empty_reply_kept_by_default() {
        let relay = MockRelayClient::new();
        relay.queue_reply("");

        let mut s = TestSession::new().relay(relay).build();
        s.handle.submit("hello").await.unwrap();
        assert!(s.wait_for_exchanges(1, WAIT).await);

        assert_eq!(
            s.transcript_texts(),
            vec![pair("user", "hello"), pair("bot", "")]
        );
    }

    #[tokio::test]
    async fn test_empty_reply_fallback() {
        let relay = MockRelayClient::new();
        relay.queue_reply("");

        let mut s = TestSession::new()
            .relay(relay)
            .empty_reply(EmptyReplyPolicy::Fallback("(no reply)".to_string()))
            .build();
        s.handle.submit("hello").await.unwrap();
        assert!(s.wait_for_exchanges(1, WAIT).await);

        assert_eq!(s.transcript_texts()[1], pair("bot", "(no reply)"));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_timers() {
        let relay = MockRelayClient::new();
        relay.queue_reply("never");

        let mut s = TestSession::new()
            .relay(relay)
            .time_unit(Duration::from_millis(50))
            .build();
        let watch = s.handle.watch();
        s.handle.submit("hello").await.unwrap();
        assert!(s.wait_for_phase("sending", WAIT).await);

        let TestSession { handle, relay, .. } = s;
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(relay.recorded_requests().is_empty());
        let last = watch.borrow().clone();
        assert_eq!(last.transcript.len(), 1);
        assert!(matches!(last.phase, Phase::Sending { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_discards_in_flight_reply() {
        let relay = DelayedMockRelayClient::new(Duration::from_millis(200));
        relay.queue_reply("too late");
        let started = relay.request_started.clone();

        let s = TestSession::new().relay(relay).build();
        let watch = s.handle.watch();
        s.handle.submit("hello").await.unwrap();

        tokio::time::timeout(WAIT, started.notified())
            .await
            .expect("relay call never started");
        s.handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        let last = watch.borrow().clone();
        assert_eq!(last.transcript.len(), 1);
        assert!(matches!(
            last.phase,
            Phase::TypingIndicator {
                request_sent: true,
                ..
            }
        ));
        assert_eq!(s.relay.recorded_requests(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_settle_waits_for_queued_send() {
        let relay = MockRelayClient::new();
        relay.queue_reply("done");

        let s = TestSession::new().relay(relay).build();
        s.handle.submit("hello").await.unwrap();
        tokio::time::timeout(WAIT, s.handle.settle())
            .await
            .expect("settle timed out")
            .unwrap();

        assert_eq!(
            s.transcript_texts(),
            vec![pair("user", "hello"), pair("bot", "done")]
        );
    }

    #[tokio::test]
    async fn test_commands_after_shutdown_fail() {
        let s = TestSession::new().build();
        s.handle.shutdown.cancel();
        tokio::time::timeout(WAIT, async {
            while !s.handle.task.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("runtime did not stop");

        // Runtime is gone: snapshot stays readable, commands are refused
        assert_eq!(s.snapshot().phase, Phase::Idle);
        assert_eq!(s.handle.submit("hello").await, Err(SessionClosed));
        assert_eq!(s.handle.settle().await, Err(SessionClosed));
        assert!(s.relay.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_session() {
        let s = TestSession::new().build();
        let mut events = s.handle.subscribe();
        drop(s);

        // Sender side goes away once the runtime task exits
        let closed = tokio::time::timeout(WAIT, async {
            loop {
                if let Err(broadcast::error::RecvError::Closed) = events.recv().await {
                    return;
                }
            }
        })
        .await;
        assert!(closed.is_ok());
    }
}

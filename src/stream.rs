//! Stream client
//!
//! Maintains exactly one logical streaming connection per active session and
//! redelivers inbound events to subscribers by kind. Owns the reconnection
//! policy: linear backoff, same session id, bounded attempt count.
//!
//! Connections are identified by an epoch counter. Every successful open and
//! every explicit teardown bumps the epoch, so a receive loop that outlives
//! its connection can tell it went stale and must not drive reconnection or
//! touch shared state.

use crate::config::ClientConfig;
use crate::domain::events::{EventKind, StreamEvent};
use crate::error::Result;
use crate::ports::stream::{FrameSink, FrameSource, StreamConnector};
use crate::state::SharedConnectionState;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Connection lifecycle of the stream client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

/// Identifies one registered handler for [`StreamClient::off`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type EventHandler = Box<dyn Fn(&StreamEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
struct HandlerRegistry {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<(HandlerId, EventHandler)>>,
}

struct StreamInner {
    sink: Option<Box<dyn FrameSink>>,
    session_id: Option<String>,
    status: StreamStatus,
    epoch: u64,
    reconnect_attempts: u32,
    reconnect_task: Option<JoinHandle<()>>,
    read_task: Option<JoinHandle<()>>,
}

struct StreamShared {
    connector: Arc<dyn StreamConnector>,
    conn_state: SharedConnectionState,
    handlers: StdMutex<HandlerRegistry>,
    inner: Mutex<StreamInner>,
    max_reconnect_attempts: u32,
    reconnect_base_delay: Duration,
}

/// Event stream client bound to at most one session at a time
pub struct StreamClient {
    shared: Arc<StreamShared>,
}

impl StreamClient {
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        conn_state: SharedConnectionState,
        config: &ClientConfig,
    ) -> Self {
        Self {
            shared: Arc::new(StreamShared {
                connector,
                conn_state,
                handlers: StdMutex::new(HandlerRegistry::default()),
                inner: Mutex::new(StreamInner {
                    sink: None,
                    session_id: None,
                    status: StreamStatus::Disconnected,
                    epoch: 0,
                    reconnect_attempts: 0,
                    reconnect_task: None,
                    read_task: None,
                }),
                max_reconnect_attempts: config.max_reconnect_attempts,
                reconnect_base_delay: config.reconnect_base_delay(),
            }),
        }
    }

    /// Open a connection scoped to `session_id`
    ///
    /// Any prior connection is closed first and its pending reconnect is
    /// cancelled; the attempt counter starts fresh for the new binding.
    pub async fn connect(&self, session_id: &str) -> Result<()> {
        self.teardown().await;
        {
            let mut inner = self.shared.inner.lock().await;
            inner.session_id = Some(session_id.to_string());
            inner.reconnect_attempts = 0;
        }
        open(&self.shared, session_id).await
    }

    /// Close the active connection, if any
    ///
    /// Never fails: disconnecting while not connected is a no-op. Cancels a
    /// pending reconnect attempt and resets the attempt counter.
    pub async fn disconnect(&self) {
        self.teardown().await;
        {
            let mut inner = self.shared.inner.lock().await;
            inner.session_id = None;
        }
        self.shared.conn_state.clear_session();
        log::info!("event stream disconnected");
    }

    /// Subscribe a handler for one event kind
    ///
    /// Handlers for a kind run in subscription order. A handler error is
    /// logged and isolated; it never blocks other handlers or later events.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&StreamEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.shared.handlers.lock().unwrap();
        registry.next_id += 1;
        let id = HandlerId(registry.next_id);
        registry
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Unsubscribe a previously registered handler
    pub fn off(&self, kind: EventKind, id: HandlerId) {
        let mut registry = self.shared.handlers.lock().unwrap();
        if let Some(list) = registry.handlers.get_mut(&kind) {
            list.retain(|(registered, _)| *registered != id);
        }
    }

    /// Forward a payload over the active connection
    ///
    /// Returns false (and logs) when the stream is not connected or the
    /// payload cannot be serialized; never raises.
    pub async fn send<T: Serialize>(&self, payload: &T) -> bool {
        let frame = match serde_json::to_string(payload) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("cannot serialize outbound payload: {}", e);
                return false;
            }
        };
        let mut inner = self.shared.inner.lock().await;
        match inner.sink.as_mut() {
            Some(sink) => match sink.send(frame).await {
                Ok(()) => true,
                Err(e) => {
                    log::error!("failed to send frame: {}", e);
                    false
                }
            },
            None => {
                log::warn!("send ignored: event stream is not connected");
                false
            }
        }
    }

    pub async fn status(&self) -> StreamStatus {
        self.shared.inner.lock().await.status
    }

    /// Close the current connection and cancel reconnection without touching
    /// the session binding
    async fn teardown(&self) {
        let (sink, read_task, reconnect_task) = {
            let mut inner = self.shared.inner.lock().await;
            inner.epoch += 1;
            inner.reconnect_attempts = 0;
            inner.status = StreamStatus::Disconnected;
            (
                inner.sink.take(),
                inner.read_task.take(),
                inner.reconnect_task.take(),
            )
        };
        if let Some(task) = reconnect_task {
            task.abort();
        }
        if let Some(mut sink) = sink {
            let _ = sink.close().await;
        }
        if let Some(task) = read_task {
            task.abort();
        }
        self.shared.conn_state.set_disconnected();
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.shared.inner.try_lock() {
            if let Some(task) = inner.read_task.take() {
                task.abort();
            }
            if let Some(task) = inner.reconnect_task.take() {
                task.abort();
            }
        }
    }
}

/// Open one connection attempt for `session_id` and install it on success
async fn open(shared: &Arc<StreamShared>, session_id: &str) -> Result<()> {
    let epoch_at_start = {
        let mut inner = shared.inner.lock().await;
        inner.status = StreamStatus::Connecting;
        inner.epoch
    };

    match shared.connector.connect(session_id).await {
        Ok((sink, source)) => {
            let mut inner = shared.inner.lock().await;
            if inner.epoch != epoch_at_start {
                // a disconnect or a newer connect won the race while the
                // transport was opening; discard this connection
                drop(inner);
                let mut sink = sink;
                let _ = sink.close().await;
                return Err(crate::error::ClientError::Stream(
                    "connection superseded".to_string(),
                ));
            }
            inner.epoch += 1;
            let epoch = inner.epoch;
            inner.sink = Some(sink);
            inner.status = StreamStatus::Connected;
            inner.reconnect_attempts = 0;
            inner.session_id = Some(session_id.to_string());
            shared.conn_state.set_connected(session_id);
            inner.read_task = Some(tokio::spawn(read_loop(Arc::clone(shared), source, epoch)));
            log::info!("event stream connected for session {}", session_id);
            Ok(())
        }
        Err(e) => {
            let mut inner = shared.inner.lock().await;
            if inner.epoch == epoch_at_start && inner.status == StreamStatus::Connecting {
                inner.status = StreamStatus::Disconnected;
            }
            shared.conn_state.record_error(format!("stream connect failed: {}", e));
            Err(e)
        }
    }
}

/// Receive loop for one connection; runs until the connection ends
async fn read_loop(shared: Arc<StreamShared>, mut source: Box<dyn FrameSource>, epoch: u64) {
    loop {
        match source.next_frame().await {
            Some(Ok(frame)) => dispatch_frame(&shared, &frame),
            Some(Err(e)) => {
                log::error!("stream transport error: {}", e);
                shared.conn_state.record_error(e.to_string());
                break;
            }
            None => {
                log::info!("event stream closed by peer");
                break;
            }
        }
    }
    handle_close(&shared, epoch).await;
}

/// Decode and deliver one inbound frame
///
/// Frames that fail to decode are logged and dropped; they reach no handler.
fn dispatch_frame(shared: &StreamShared, frame: &str) {
    let event: StreamEvent = match serde_json::from_str(frame) {
        Ok(event) => event,
        Err(e) => {
            log::warn!("dropping undecodable frame: {}", e);
            return;
        }
    };

    let registry = shared.handlers.lock().unwrap();
    if let Some(list) = registry.handlers.get(&event.kind()) {
        for (id, handler) in list {
            if let Err(e) = handler(&event) {
                log::error!("handler {:?} for {} failed: {:#}", id, event.kind(), e);
            }
        }
    }
}

/// React to an unexpected close of the connection identified by `epoch`
async fn handle_close(shared: &Arc<StreamShared>, epoch: u64) {
    let mut inner = shared.inner.lock().await;
    if inner.epoch != epoch {
        // deliberately closed or already replaced
        return;
    }
    inner.sink = None;
    inner.status = StreamStatus::Disconnected;
    shared.conn_state.set_disconnected();
    schedule_reconnect(shared, &mut inner);
}

/// Schedule the next reconnect attempt, or give up once the budget is spent
fn schedule_reconnect(shared: &Arc<StreamShared>, inner: &mut StreamInner) {
    let Some(session_id) = inner.session_id.clone() else {
        return;
    };
    let attempt = inner.reconnect_attempts + 1;
    if attempt > shared.max_reconnect_attempts {
        log::error!(
            "giving up on session {} after {} reconnect attempts",
            session_id,
            inner.reconnect_attempts
        );
        shared
            .conn_state
            .record_error("failed to reconnect to server");
        return;
    }
    inner.reconnect_attempts = attempt;
    inner.status = StreamStatus::Reconnecting { attempt };

    let delay = shared.reconnect_base_delay * attempt;
    log::info!(
        "reconnect attempt {}/{} for session {} in {:?}",
        attempt,
        shared.max_reconnect_attempts,
        session_id,
        delay
    );
    let shared = Arc::clone(shared);
    inner.reconnect_task = Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = open(&shared, &session_id).await {
            log::warn!("reconnect attempt {} failed: {}", attempt, e);
            let mut inner = shared.inner.lock().await;
            schedule_reconnect(&shared, &mut inner);
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventPayload;
    use crate::ports::mocks::MockStreamConnector;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client_with(
        connector: &Arc<MockStreamConnector>,
        state: &SharedConnectionState,
    ) -> StreamClient {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = ClientConfig::default();
        let connector: Arc<dyn StreamConnector> = Arc::clone(connector) as _;
        StreamClient::new(connector, state.clone(), &config)
    }

    fn transcript_frame(session_id: &str, id: &str, text: &str) -> String {
        format!(
            r#"{{"kind": "transcript-segment",
                "payload": {{"id": "{id}", "text": "{text}", "timestamp": "2024-05-01T09:00:01Z", "confidence": 0.9}},
                "timestamp": "2024-05-01T09:00:01Z",
                "session_id": "{session_id}"}}"#
        )
    }

    /// Let spawned tasks run and paused time advance a little
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_updates_connection_state() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let _handle = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("abc123").await.unwrap();

        assert_eq!(client.status().await, StreamStatus::Connected);
        let snapshot = state.snapshot();
        assert!(snapshot.stream_connected);
        assert_eq!(snapshot.current_session_id.as_deref(), Some("abc123"));
        assert_eq!(snapshot.last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_rejects_without_scheduling_reconnect() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        connector.script_failure("connection refused");
        let client = client_with(&connector, &state);

        assert!(client.connect("abc123").await.is_err());
        assert_eq!(client.status().await, StreamStatus::Disconnected);
        assert!(state.last_error().is_some());

        // no timer was armed: nothing further connects however long we wait
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn handlers_run_in_subscription_order() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        let order = Arc::new(StdMutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            client.on(EventKind::TranscriptSegment, move |_| {
                order.lock().unwrap().push(label);
                Ok(())
            });
        }

        client.connect("s1").await.unwrap();
        handle.frames.send(Ok(transcript_frame("s1", "t1", "hi"))).unwrap();
        settle().await;

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn handler_error_does_not_block_remaining_handlers() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        let delivered = Arc::new(AtomicUsize::new(0));
        client.on(EventKind::TranscriptSegment, |_| Err(anyhow::anyhow!("boom")));
        {
            let delivered = Arc::clone(&delivered);
            client.on(EventKind::TranscriptSegment, move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        client.connect("s1").await.unwrap();
        handle.frames.send(Ok(transcript_frame("s1", "t1", "a"))).unwrap();
        handle.frames.send(Ok(transcript_frame("s1", "t2", "b"))).unwrap();
        settle().await;

        // the failing handler neither stopped its peer nor later events
        assert_eq!(delivered.load(Ordering::SeqCst), 2);
        assert_eq!(client.status().await, StreamStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_frame_is_dropped_not_dispatched() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        let seen = Arc::new(StdMutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            client.on(EventKind::TranscriptSegment, move |event| {
                if let EventPayload::TranscriptSegment(segment) = &event.payload {
                    seen.lock().unwrap().push(segment.id.clone());
                }
                Ok(())
            });
        }

        client.connect("s1").await.unwrap();
        handle.frames.send(Ok("{not json".to_string())).unwrap();
        handle.frames.send(Ok(transcript_frame("s1", "t1", "ok"))).unwrap();
        settle().await;

        assert_eq!(*seen.lock().unwrap(), vec!["t1".to_string()]);
        assert_eq!(client.status().await, StreamStatus::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn off_unsubscribes_a_single_handler() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        let count = Arc::new(AtomicUsize::new(0));
        let id = {
            let count = Arc::clone(&count);
            client.on(EventKind::TranscriptSegment, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        };
        client.off(EventKind::TranscriptSegment, id);

        client.connect("s1").await.unwrap();
        handle.frames.send(Ok(transcript_frame("s1", "t1", "a"))).unwrap();
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_close_reconnects_after_base_delay() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let first = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("s1").await.unwrap();
        let _second = connector.script_connection();

        // peer drops the connection
        drop(first.frames);
        settle().await;

        assert!(!state.is_stream_connected());
        assert_eq!(client.status().await, StreamStatus::Reconnecting { attempt: 1 });
        assert_eq!(connector.attempts().len(), 1);

        // first attempt fires at 1 x base_delay, bound to the same session
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(connector.attempts(), vec!["s1".to_string(), "s1".to_string()]);
        assert_eq!(client.status().await, StreamStatus::Connected);
        assert!(state.is_stream_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_gives_up_after_max_attempts() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("s1").await.unwrap();
        // no further outcomes scripted: every reconnect attempt fails
        drop(handle.frames);
        tokio::time::sleep(Duration::from_secs(60)).await;

        // 1 initial connect + exactly 5 reconnect attempts, never a 6th
        assert_eq!(connector.attempts().len(), 6);
        assert_eq!(client.status().await, StreamStatus::Disconnected);
        assert_eq!(
            state.last_error().as_deref(),
            Some("failed to reconnect to server")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn successful_reconnect_resets_the_attempt_budget() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let first = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("s1").await.unwrap();

        // fail 4 attempts, then let the 5th succeed
        for _ in 0..4 {
            connector.script_failure("still down");
        }
        let revived = connector.script_connection();
        drop(first.frames);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.status().await, StreamStatus::Connected);

        // a later close starts a fresh streak rather than being attempt 6
        let _third = connector.script_connection();
        drop(revived.frames);
        settle().await;
        assert_eq!(client.status().await, StreamStatus::Reconnecting { attempt: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_a_pending_reconnect() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let handle = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("s1").await.unwrap();
        drop(handle.frames);
        settle().await;
        assert_eq!(client.status().await, StreamStatus::Reconnecting { attempt: 1 });

        client.disconnect().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(client.status().await, StreamStatus::Disconnected);
        let snapshot = state.snapshot();
        assert!(!snapshot.stream_connected);
        assert_eq!(snapshot.current_session_id, None);
    }

    #[tokio::test(start_paused = true)]
    async fn rebind_closes_the_previous_connection() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let first = connector.script_connection();
        let client = client_with(&connector, &state);
        client.connect("s1").await.unwrap();

        let _second = connector.script_connection();
        client.connect("s2").await.unwrap();

        // the old sink was closed, so its outbound channel is gone
        let mut old_sent = first.sent;
        assert!(old_sent.recv().await.is_none());
        assert_eq!(state.current_session_id().as_deref(), Some("s2"));
    }

    #[tokio::test(start_paused = true)]
    async fn send_without_connection_is_a_reported_noop() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let client = client_with(&connector, &state);

        assert!(!client.send(&serde_json::json!({"kind": "ping"})).await);
    }

    #[tokio::test(start_paused = true)]
    async fn send_forwards_serialized_payload() {
        let connector = MockStreamConnector::new();
        let state = SharedConnectionState::new();
        let mut handle = connector.script_connection();
        let client = client_with(&connector, &state);

        client.connect("s1").await.unwrap();
        assert!(client.send(&serde_json::json!({"kind": "ping"})).await);

        let frame = handle.sent.recv().await.unwrap();
        assert_eq!(frame, r#"{"kind":"ping"}"#);
    }
}

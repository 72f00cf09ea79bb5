//! Session coordinator
//!
//! Composes the request client and the stream client into the stateful view
//! the UI consumes: current session, flat transcript log, latest summary.
//! State-changing calls go over HTTP; asynchronous results arrive over the
//! event stream and mutate the view through the handlers wired here.

use crate::adapters::{HttpSessionApi, WsConnector};
use crate::config::ClientConfig;
use crate::domain::events::{EventKind, EventPayload};
use crate::domain::models::{MeetingSummary, SessionState, TranscriptSegment};
use crate::error::Result;
use crate::ports::api::{AckResponse, CreateSessionResponse, SessionApi};
use crate::state::{ConnectionState, SharedConnectionState};
use crate::stream::StreamClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Observable view shared between coordinator methods and stream handlers
#[derive(Default)]
struct SessionView {
    current_session: Mutex<Option<SessionState>>,
    transcripts: Mutex<Vec<TranscriptSegment>>,
    summary: Mutex<Option<MeetingSummary>>,
    loading: AtomicBool,
}

/// Keeps the loading flag true for exactly the lifetime of one API call
struct LoadingGuard {
    view: Arc<SessionView>,
}

impl LoadingGuard {
    fn acquire(view: &Arc<SessionView>) -> Self {
        view.loading.store(true, Ordering::SeqCst);
        Self {
            view: Arc::clone(view),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.view.loading.store(false, Ordering::SeqCst);
    }
}

/// Stateful client facade over the request and stream channels
pub struct SessionCoordinator {
    api: Arc<dyn SessionApi>,
    stream: StreamClient,
    conn_state: SharedConnectionState,
    view: Arc<SessionView>,
}

impl SessionCoordinator {
    /// Build a coordinator over explicit port implementations
    pub fn new(
        api: Arc<dyn SessionApi>,
        stream: StreamClient,
        conn_state: SharedConnectionState,
    ) -> Self {
        let view = Arc::new(SessionView::default());
        wire_stream_handlers(&stream, &view, &conn_state);
        Self {
            api,
            stream,
            conn_state,
            view,
        }
    }

    /// Build a coordinator wired to the reqwest and tungstenite adapters
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let conn_state = SharedConnectionState::new();
        let api = Arc::new(HttpSessionApi::new(config)?);
        let connector = Arc::new(WsConnector::new(config));
        let stream = StreamClient::new(connector, conn_state.clone(), config);
        Ok(Self::new(api, stream, conn_state))
    }

    /// Create a remote session, bind the event stream to it and fetch the
    /// initial snapshot
    ///
    /// The view is published only after all three steps succeed; on any
    /// failure the previously current session (if any) is left untouched.
    pub async fn create_session(&self) -> Result<CreateSessionResponse> {
        let _loading = LoadingGuard::acquire(&self.view);

        let created = self.api.create_session().await?;
        if !created.success {
            log::warn!("service declined session creation: {}", created.message);
            return Ok(created);
        }

        self.stream.connect(&created.session_id).await?;
        let snapshot = self.api.get_session(&created.session_id).await?;

        *self.view.transcripts.lock().unwrap() =
            snapshot.session.transcript_segments.clone();
        *self.view.summary.lock().unwrap() = snapshot.session.current_summary.clone();
        *self.view.current_session.lock().unwrap() = Some(snapshot.session);

        log::info!("session {} is now current", created.session_id);
        Ok(created)
    }

    /// Start recording; no-op when no session is current
    pub async fn start_recording(&self) -> Result<Option<AckResponse>> {
        let Some(session_id) = self.current_session_id() else {
            return Ok(None);
        };
        let _loading = LoadingGuard::acquire(&self.view);

        let response = self.api.start_recording(&session_id).await?;
        if response.success {
            self.set_recording(true);
        }
        Ok(Some(response))
    }

    /// Stop recording; no-op when no session is current
    pub async fn stop_recording(&self) -> Result<Option<AckResponse>> {
        let Some(session_id) = self.current_session_id() else {
            return Ok(None);
        };
        let _loading = LoadingGuard::acquire(&self.view);

        let response = self.api.stop_recording(&session_id).await?;
        if response.success {
            self.set_recording(false);
        }
        Ok(Some(response))
    }

    /// Request summary generation; the summary itself arrives later as a
    /// summary-generated stream event, never as this call's return value
    pub async fn generate_summary(&self) -> Result<Option<AckResponse>> {
        let Some(session_id) = self.current_session_id() else {
            return Ok(None);
        };
        let _loading = LoadingGuard::acquire(&self.view);

        Ok(Some(self.api.generate_summary(&session_id).await?))
    }

    /// Delete the current session, disconnect the stream and clear the view
    pub async fn end_session(&self) -> Result<Option<AckResponse>> {
        let Some(session_id) = self.current_session_id() else {
            return Ok(None);
        };
        let response = {
            let _loading = LoadingGuard::acquire(&self.view);
            self.api.delete_session(&session_id).await?
        };
        if response.success {
            self.stream.disconnect().await;
            *self.view.current_session.lock().unwrap() = None;
            self.conn_state.set_recording(false);
            log::info!("session {} ended", session_id);
        }
        Ok(Some(response))
    }

    /// Direct access to the stream client for custom subscriptions or sends
    pub fn stream(&self) -> &StreamClient {
        &self.stream
    }

    pub fn current_session(&self) -> Option<SessionState> {
        self.view.current_session.lock().unwrap().clone()
    }

    pub fn transcripts(&self) -> Vec<TranscriptSegment> {
        self.view.transcripts.lock().unwrap().clone()
    }

    pub fn current_summary(&self) -> Option<MeetingSummary> {
        self.view.summary.lock().unwrap().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.view.loading.load(Ordering::SeqCst)
    }

    pub fn connection(&self) -> ConnectionState {
        self.conn_state.snapshot()
    }

    fn current_session_id(&self) -> Option<String> {
        self.view
            .current_session
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.session_id.clone())
    }

    /// Flip the local and the shared recording flag together so they never
    /// disagree after a successful call
    fn set_recording(&self, is_recording: bool) {
        if let Some(session) = self.view.current_session.lock().unwrap().as_mut() {
            session.is_recording = is_recording;
        }
        self.conn_state.set_recording(is_recording);
    }
}

/// Subscribe the handlers that fold stream events into the view
///
/// Transcript and summary events are applied only when their session id
/// matches the current session, so events from a stale binding (late frames
/// after a rebind) cannot corrupt the view. Error events are connection-level
/// diagnostics and are recorded unconditionally.
fn wire_stream_handlers(
    stream: &StreamClient,
    view: &Arc<SessionView>,
    conn_state: &SharedConnectionState,
) {
    {
        let view = Arc::clone(view);
        stream.on(EventKind::TranscriptSegment, move |event| {
            let EventPayload::TranscriptSegment(segment) = &event.payload else {
                return Ok(());
            };
            let mut current = view.current_session.lock().unwrap();
            let Some(session) = current.as_mut() else {
                return Ok(());
            };
            if session.session_id != event.session_id {
                log::debug!(
                    "ignoring transcript for stale session {}",
                    event.session_id
                );
                return Ok(());
            }
            view.transcripts.lock().unwrap().push(segment.clone());
            session.transcript_segments.push(segment.clone());
            Ok(())
        });
    }

    {
        let view = Arc::clone(view);
        stream.on(EventKind::SummaryGenerated, move |event| {
            let EventPayload::SummaryGenerated(summary) = &event.payload else {
                return Ok(());
            };
            let mut current = view.current_session.lock().unwrap();
            let Some(session) = current.as_mut() else {
                return Ok(());
            };
            if session.session_id != event.session_id {
                log::debug!("ignoring summary for stale session {}", event.session_id);
                return Ok(());
            }
            // wholesale replacement, never a merge
            *view.summary.lock().unwrap() = Some(summary.clone());
            session.current_summary = Some(summary.clone());
            Ok(())
        });
    }

    {
        let conn_state = conn_state.clone();
        stream.on(EventKind::Error, move |event| {
            let EventPayload::Error(error) = &event.payload else {
                return Ok(());
            };
            let message = if error.message.is_empty() {
                "unknown stream error".to_string()
            } else {
                error.message.clone()
            };
            log::error!("stream error event: {}", message);
            conn_state.record_error(message);
            Ok(())
        });
    }
}

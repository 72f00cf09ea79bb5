//! Shared connection state
//!
//! Single source of truth for connectivity and recording status, constructed
//! explicitly and injected into the stream client and the coordinator rather
//! than living in a process-wide global. Mutators are crate-private: only the
//! stream client's connection-lifecycle transitions and the coordinator's
//! recording toggles write here.

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Snapshot of the current connectivity/recording/error status
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConnectionState {
    /// Whether the event stream is currently connected
    pub stream_connected: bool,

    /// Session id the stream is bound to, if any
    pub current_session_id: Option<String>,

    /// Whether recording is active for the current session
    pub is_recording: bool,

    /// Most recent connection or stream error, if any
    pub last_error: Option<String>,
}

/// Cheaply cloneable handle to one [`ConnectionState`] instance
#[derive(Clone, Default)]
pub struct SharedConnectionState {
    inner: Arc<Mutex<ConnectionState>>,
}

impl SharedConnectionState {
    /// Creates a fresh state: disconnected, no session, no error
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state
    pub fn snapshot(&self) -> ConnectionState {
        self.inner.lock().unwrap().clone()
    }

    pub fn is_stream_connected(&self) -> bool {
        self.inner.lock().unwrap().stream_connected
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.inner.lock().unwrap().current_session_id.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().unwrap().last_error.clone()
    }

    pub(crate) fn set_connected(&self, session_id: &str) {
        let mut state = self.inner.lock().unwrap();
        state.stream_connected = true;
        state.current_session_id = Some(session_id.to_string());
        state.last_error = None;
    }

    pub(crate) fn set_disconnected(&self) {
        self.inner.lock().unwrap().stream_connected = false;
    }

    pub(crate) fn clear_session(&self) {
        self.inner.lock().unwrap().current_session_id = None;
    }

    pub(crate) fn set_recording(&self, is_recording: bool) {
        self.inner.lock().unwrap().is_recording = is_recording;
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        self.inner.lock().unwrap().last_error = Some(message.into());
    }
}

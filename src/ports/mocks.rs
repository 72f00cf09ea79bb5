//! Mock implementations for testing

use crate::error::{ClientError, Result};
use crate::ports::stream::{FrameSink, FrameSource, StreamConnector};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One scripted outcome for a connect attempt
enum ScriptedOutcome {
    Fail(String),
    Open {
        frames_rx: mpsc::UnboundedReceiver<Result<String>>,
        sent_tx: mpsc::UnboundedSender<String>,
    },
}

/// Test-side handle to a scripted connection
pub struct MockConnectionHandle {
    /// Inject inbound frames; dropping this sender closes the connection
    /// from the peer side.
    pub frames: mpsc::UnboundedSender<Result<String>>,

    /// Observe frames the client sent; `recv()` returns `None` once the
    /// client closed its sink.
    pub sent: mpsc::UnboundedReceiver<String>,
}

/// Stream connector whose connect attempts pop pre-scripted outcomes
#[derive(Default)]
pub struct MockStreamConnector {
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    attempts: Mutex<Vec<String>>,
}

impl MockStreamConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the next connect attempt to fail
    pub fn script_failure(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Fail(message.to_string()));
    }

    /// Script the next connect attempt to succeed, returning the test-side
    /// handle for injecting and observing frames
    pub fn script_connection(&self) -> MockConnectionHandle {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Open { frames_rx, sent_tx });
        MockConnectionHandle {
            frames: frames_tx,
            sent: sent_rx,
        }
    }

    /// Session ids passed to connect, one entry per attempt
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamConnector for MockStreamConnector {
    async fn connect(&self, session_id: &str) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>)> {
        self.attempts.lock().unwrap().push(session_id.to_string());
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(ScriptedOutcome::Open { frames_rx, sent_tx }) => Ok((
                Box::new(MockSink { tx: Some(sent_tx) }),
                Box::new(MockSource { rx: frames_rx }),
            )),
            Some(ScriptedOutcome::Fail(message)) => Err(ClientError::Stream(message)),
            None => Err(ClientError::Stream("no scripted outcome left".to_string())),
        }
    }
}

struct MockSink {
    tx: Option<mpsc::UnboundedSender<String>>,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: String) -> Result<()> {
        match &self.tx {
            Some(tx) => tx
                .send(frame)
                .map_err(|_| ClientError::Stream("peer dropped".to_string())),
            None => Err(ClientError::Stream("sink closed".to_string())),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }
}

struct MockSource {
    rx: mpsc::UnboundedReceiver<Result<String>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.rx.recv().await
    }
}

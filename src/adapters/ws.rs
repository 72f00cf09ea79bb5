//! WebSocket stream adapter
//!
//! Implements the StreamConnector port with tokio-tungstenite. One logical
//! connection per session at `{ws_base_url}/ws/{session_id}`, split into a
//! write sink and a read stream.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::ports::stream::{FrameSink, FrameSource, StreamConnector};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// tokio-tungstenite-backed implementation of [`StreamConnector`]
pub struct WsConnector {
    ws_base_url: String,
}

impl WsConnector {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            ws_base_url: config.ws_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/ws/{}", self.ws_base_url, session_id)
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, session_id: &str) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>)> {
        let url = self.session_url(session_id);
        log::info!("connecting event stream: {}", url);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Stream(format!("websocket connect failed: {}", e)))?;

        let (write, read) = ws_stream.split();
        Ok((Box::new(WsSink { inner: write }), Box::new(WsSource { inner: read })))
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.inner
            .send(Message::Text(frame))
            .await
            .map_err(|e| ClientError::Stream(format!("failed to send frame: {}", e)))
    }

    async fn close(&mut self) -> Result<()> {
        let _ = self.inner.send(Message::Close(None)).await;
        let _ = self.inner.close().await;
        Ok(())
    }
}

struct WsSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FrameSource for WsSource {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        while let Some(message) = self.inner.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // binary/ping/pong frames are transport noise for this protocol
                Ok(_) => continue,
                Err(e) => return Some(Err(ClientError::Stream(e.to_string()))),
            }
        }
        None
    }
}

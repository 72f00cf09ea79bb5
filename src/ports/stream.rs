/// Streaming transport port
///
/// The stream client drives reconnection and dispatch against these traits;
/// the production adapter wraps a tokio-tungstenite socket and tests script
/// connections through the mock connector.
use crate::error::Result;
use async_trait::async_trait;

/// Opens one logical connection scoped to a session id
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Resolves once the transport reports open; rejects if the transport
    /// errors before opening.
    async fn connect(&self, session_id: &str) -> Result<(Box<dyn FrameSink>, Box<dyn FrameSource>)>;
}

/// Outbound half of a connection
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Inbound half of a connection
#[async_trait]
pub trait FrameSource: Send {
    /// Next text frame. `None` when the connection closed cleanly,
    /// `Some(Err)` on transport failure (treated as a close as well).
    async fn next_frame(&mut self) -> Option<Result<String>>;
}

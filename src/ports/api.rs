/// Request/response port for the session service
///
/// One method per service operation; implementations normalize failures into
/// [`ClientError`](crate::error::ClientError) but perform no retries and no
/// local guards - calling start when already recording is forwarded as-is.
use crate::domain::models::SessionState;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Response to session creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    pub session_id: String,
    #[serde(default)]
    pub message: String,
}

/// Response carrying a full session snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: SessionState,
}

/// Plain acknowledgement response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Port trait for session lifecycle and recording control
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Create a new session on the service
    async fn create_session(&self) -> Result<CreateSessionResponse>;

    /// Fetch the full snapshot of a session; NotFound if the id is unknown
    async fn get_session(&self, session_id: &str) -> Result<SessionResponse>;

    /// Delete a session
    async fn delete_session(&self, session_id: &str) -> Result<AckResponse>;

    /// Start recording for a session
    async fn start_recording(&self, session_id: &str) -> Result<AckResponse>;

    /// Stop recording for a session
    async fn stop_recording(&self, session_id: &str) -> Result<AckResponse>;

    /// Trigger asynchronous summary production; the summary itself arrives
    /// later over the event stream
    async fn generate_summary(&self, session_id: &str) -> Result<AckResponse>;

    /// Opaque service status payload
    async fn health_check(&self) -> Result<serde_json::Value>;
}

/// Error types for the MeetSync client
///
/// Uses thiserror for ergonomic error handling with proper Display implementations.
use thiserror::Error;

/// Main error type for the client library
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("session not found: {0}")]
    NotFound(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ClientError>;

/// Convert ClientError to a string for embedding layers (IPC, UI bindings)
impl From<ClientError> for String {
    fn from(error: ClientError) -> Self {
        error.to_string()
    }
}

//! Client configuration
//!
//! Endpoints and reconnect policy for the MeetSync service. Defaults match
//! a locally running service on port 8000.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for both the HTTP and the streaming channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for request/response calls, e.g. "http://localhost:8000"
    pub api_base_url: String,

    /// Base URL for the streaming endpoint, e.g. "ws://localhost:8000"
    pub ws_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Maximum reconnect attempts for a single unbroken failure streak
    pub max_reconnect_attempts: u32,

    /// Linear backoff base: the Nth attempt is delayed N x this value
    pub reconnect_base_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            ws_base_url: "ws://localhost:8000".to_string(),
            request_timeout_secs: 30,
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Sets both base URLs (builder pattern)
    pub fn with_base_urls(mut self, api_base_url: impl Into<String>, ws_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self.ws_base_url = ws_base_url.into();
        self
    }

    /// Sets the reconnect policy (builder pattern)
    pub fn with_reconnect_policy(mut self, max_attempts: u32, base_delay_ms: u64) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_base_delay_ms = base_delay_ms;
        self
    }

    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

//! HTTP session API adapter
//!
//! Implements the SessionApi port against the service's REST surface with
//! reqwest. Non-2xx responses carry the status code and raw body text as
//! diagnostic detail; retry policy, if any, belongs to the caller.

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::ports::api::{AckResponse, CreateSessionResponse, SessionApi, SessionResponse};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

/// reqwest-backed implementation of [`SessionApi`]
pub struct HttpSessionApi {
    client: Client,
    base_url: String,
}

impl HttpSessionApi {
    /// Create an adapter from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a response into its body text, normalizing non-2xx into
    /// `ClientError::Service`
    async fn read_body(response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ClientError::Service {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.post(self.url(path)).send().await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn create_session(&self) -> Result<CreateSessionResponse> {
        log::debug!("creating session");
        self.post_json("/api/sessions").await
    }

    async fn get_session(&self, session_id: &str) -> Result<SessionResponse> {
        let result = self
            .get_json(&format!("/api/sessions/{}", session_id))
            .await;
        match result {
            Err(ClientError::Service { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ClientError::NotFound(session_id.to_string()))
            }
            other => other,
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<AckResponse> {
        let response = self
            .client
            .delete(self.url(&format!("/api/sessions/{}", session_id)))
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn start_recording(&self, session_id: &str) -> Result<AckResponse> {
        log::debug!("starting recording for session {}", session_id);
        self.post_json(&format!("/api/sessions/{}/start-recording", session_id))
            .await
    }

    async fn stop_recording(&self, session_id: &str) -> Result<AckResponse> {
        log::debug!("stopping recording for session {}", session_id);
        self.post_json(&format!("/api/sessions/{}/stop-recording", session_id))
            .await
    }

    async fn generate_summary(&self, session_id: &str) -> Result<AckResponse> {
        log::debug!("requesting summary for session {}", session_id);
        self.post_json(&format!("/api/sessions/{}/generate-summary", session_id))
            .await
    }

    async fn health_check(&self) -> Result<serde_json::Value> {
        self.get_json("/health").await
    }
}

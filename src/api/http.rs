//! reqwest-backed [`Backend`]

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::backend::{Backend, ByteStream};
use super::error::ApiError;
use super::types::{
    ArtifactEnvelope, ArtifactRef, ArtifactRequest, CollectionRecord, CreateSessionRequest,
    RefinementRequest, SessionEnvelope, SessionInfo,
};
use crate::settings::ApiSettings;

/// HTTP client for the canvas backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client whose every request (body included) is bounded by the
    /// configured timeout
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post_json<R: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<R, ApiError> {
        let response = self.post(path, body).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<SessionInfo, ApiError> {
        let envelope: SessionEnvelope = self.post_json("sessions", request).await?;
        if !envelope.ok {
            log::warn!("Session endpoint answered without ok=true");
        }
        envelope.session.ok_or(ApiError::MissingField("session"))
    }

    async fn open_refinement(&self, request: &RefinementRequest) -> Result<ByteStream, ApiError> {
        let response = self.post("chat/stream", request).await?;
        Ok(response.bytes_stream().map_err(ApiError::from).boxed())
    }

    async fn create_artifact(&self, request: &ArtifactRequest) -> Result<ArtifactRef, ApiError> {
        let envelope: ArtifactEnvelope = self.post_json("agent/artifacts", request).await?;
        envelope
            .into_ref()
            .ok_or(ApiError::MissingField("artifact.id"))
    }

    async fn record_collection(
        &self,
        session_id: &str,
        record: &CollectionRecord,
    ) -> Result<(), ApiError> {
        self.post(&format!("sessions/{session_id}/collect"), record)
            .await
            .map(|_| ())
    }
}

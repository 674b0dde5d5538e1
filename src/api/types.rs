//! Wire types for the canvas backend
//!
//! Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Dimension, Refinement};

/// `POST /sessions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
    pub project_id: Option<String>,
    pub initial_prompt: String,
}

/// Session as returned by the backend (extra fields ignored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionEnvelope {
    #[serde(default)]
    pub ok: bool,
    pub session: Option<SessionInfo>,
}

/// Card context sent along with a refinement message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementContext {
    pub route: String,
    pub card_id: String,
    pub card_content: String,
    pub card_title: String,
}

/// `POST /chat/stream`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementRequest {
    pub message: String,
    pub mode: String,
    pub session_id: Option<String>,
    pub context: RefinementContext,
}

/// Metadata attached to a collected card's artifact
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    pub dimension: Dimension,
    pub confidence: f32,
    pub tags: Vec<String>,
    pub refinements: Vec<Refinement>,
    pub session_id: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// `POST /agent/artifacts`
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub metadata: ArtifactMetadata,
}

/// Reference to a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
}

/// Accepts both `{ "artifact": { "id": .. } }` and a bare `{ "id": .. }`
#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactEnvelope {
    pub artifact: Option<ArtifactRef>,
    pub id: Option<String>,
}

impl ArtifactEnvelope {
    pub fn into_ref(self) -> Option<ArtifactRef> {
        self.artifact.or(self.id.map(|id| ArtifactRef { id }))
    }
}

/// `POST /sessions/{id}/collect`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    pub option_id: String,
    pub node_id: String,
}

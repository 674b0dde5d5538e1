use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::error::ApiError;
use super::types::{
    ArtifactRef, ArtifactRequest, CollectionRecord, CreateSessionRequest, RefinementRequest,
    SessionInfo,
};

/// Raw response body of a streamed refinement, in arrival order
pub type ByteStream = BoxStream<'static, Result<Bytes, ApiError>>;

/// Everything the canvas needs from the outside world.
///
/// [`super::HttpBackend`] is the production implementation; tests substitute
/// in-memory backends.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Create the session a canvas files its work under
    async fn create_session(&self, request: &CreateSessionRequest)
    -> Result<SessionInfo, ApiError>;

    /// Start a refinement and hand back its body as a byte stream
    async fn open_refinement(&self, request: &RefinementRequest) -> Result<ByteStream, ApiError>;

    /// Persist a collected card as an artifact
    async fn create_artifact(&self, request: &ArtifactRequest) -> Result<ArtifactRef, ApiError>;

    /// Note a collection against the session (best-effort)
    async fn record_collection(
        &self,
        session_id: &str,
        record: &CollectionRecord,
    ) -> Result<(), ApiError>;
}

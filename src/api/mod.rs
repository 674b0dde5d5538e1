//! Backend access
//!
//! - `backend`: the [`Backend`] trait every network call goes through
//! - `http`: reqwest implementation
//! - `stream`: frame decoder for streamed refinements
//! - `types`: request/response bodies

pub mod backend;
pub mod error;
pub mod http;
pub mod stream;
pub mod types;

pub use backend::{Backend, ByteStream};
pub use error::ApiError;
pub use http::HttpBackend;
pub use stream::{LineDecoder, accumulate, chunks, frames, parse_frame};
pub use types::{
    ArtifactMetadata, ArtifactRef, ArtifactRequest, CollectionRecord, CreateSessionRequest,
    RefinementContext, RefinementRequest, SessionInfo,
};

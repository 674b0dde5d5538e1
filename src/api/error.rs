use std::time::Duration;

use thiserror::Error;

/// Errors talking to the backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: HTTP {status} - {body}")]
    Status { status: u16, body: String },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Byte stream failed mid-body
    #[error("stream error: {0}")]
    Stream(String),
}

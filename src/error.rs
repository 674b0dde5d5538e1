//! Canvas error types

use thiserror::Error;

use crate::api::ApiError;
use crate::session::{CardId, Phase};

/// Errors surfaced by canvas operations.
///
/// An operation that returns `Err` has not touched any card, body or phase.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Another generate/refine request holds the processing permit
    #[error("another request is already in progress")]
    Busy,

    #[error("no card with id {0}")]
    UnknownCard(CardId),

    #[error("unknown dimension {0:?}")]
    UnknownDimension(String),

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("option generation failed: {0}")]
    Generation(String),

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("{collected} of {needed} required cards collected")]
    NotReady { needed: usize, collected: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result alias for canvas operations
pub type Result<T> = std::result::Result<T, CanvasError>;

//! Option Canvas - control core for a spatial canvas of generated options
//!
//! Core modules:
//! - `sim`: Deterministic momentum physics and the entity position store
//! - `session`: Cards, phases, generation, and suggestions
//! - `api`: Backend seam, HTTP client, and the streamed refinement decoder
//! - `canvas`: Single-threaded orchestration of all of the above
//! - `ledger`: Collected and decision logs
//! - `settings`: Data-driven configuration

pub mod api;
pub mod canvas;
pub mod error;
pub mod ledger;
pub mod session;
pub mod settings;
pub mod sim;

pub use canvas::{Canvas, CanvasSnapshot};
pub use error::{CanvasError, Result};
pub use settings::Settings;

use glam::Vec2;

/// Canvas configuration constants
pub mod consts {
    /// Multiplicative velocity decay per tick
    pub const VELOCITY_DECAY: f32 = 0.95;
    /// Velocity retained (and inverted) on a wall bounce
    pub const BOUNCE_DAMPING: f32 = 0.5;
    /// Both velocity components below this means the body is at rest
    pub const REST_EPSILON: f32 = 0.1;
    /// Pointer delta to release velocity scale
    pub const DRAG_VELOCITY_SCALE: f32 = 1.5;
    /// Margin kept between bodies and the viewport edge
    pub const VIEWPORT_PADDING: f32 = 100.0;

    /// Default viewport dimensions
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 1600.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 1000.0;

    /// Ring radius range for freshly generated cards
    pub const SPAWN_RADIUS_MIN: f32 = 250.0;
    pub const SPAWN_RADIUS_MAX: f32 = 350.0;
    /// Scale jitter (± around 1.0) for freshly generated cards
    pub const SPAWN_SCALE_JITTER: f32 = 0.05;

    /// Confidence gained per successful refinement
    pub const REFINEMENT_CONFIDENCE_STEP: f32 = 0.05;
    /// Refinement never pushes confidence past this
    pub const REFINEMENT_CONFIDENCE_CAP: f32 = 0.98;
    /// Cards above this confidence count as high-confidence
    pub const HIGH_CONFIDENCE: f32 = 0.85;

    /// Collected cards required before the build phase may start
    pub const BUILD_MIN_COLLECTED: usize = 2;
    /// Maximum number of suggestions offered at once
    pub const MAX_SUGGESTIONS: usize = 4;
}

/// Convert polar (r, theta) around `center` to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(center: Vec2, r: f32, theta: f32) -> Vec2 {
    center + Vec2::new(r * theta.cos(), r * theta.sin())
}

//! Canvas settings
//!
//! Loaded from a JSON file; anything missing falls back to the defaults in
//! [`crate::consts`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{CanvasError, Result};
use crate::sim::Bounds;

/// Environment variable overriding [`ApiSettings::base_url`]
pub const API_URL_ENV: &str = "OPTION_CANVAS_API_URL";

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// `mode` sent with refinement requests
    pub refinement_mode: String,
    /// Applied to every request, including the streamed body
    pub request_timeout_secs: u64,
    /// Project the lazily created session is filed under
    pub project_id: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api/v1".to_string(),
            refinement_mode: "quick".to_string(),
            request_timeout_secs: 60,
            project_id: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Momentum tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Velocity multiplier per tick (must be in (0, 1))
    pub decay: f32,
    /// Fraction of velocity kept (and inverted) on a wall hit
    pub bounce_damping: f32,
    /// Rest threshold per velocity component
    pub rest_epsilon: f32,
    /// Pointer delta to release velocity
    pub drag_velocity_scale: f32,
    /// Margin between bodies and the viewport edge
    pub padding: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            decay: VELOCITY_DECAY,
            bounce_damping: BOUNCE_DAMPING,
            rest_epsilon: REST_EPSILON,
            drag_velocity_scale: DRAG_VELOCITY_SCALE,
            padding: VIEWPORT_PADDING,
        }
    }
}

/// Canvas viewport size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Where freshly generated cards land
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub radius_min: f32,
    pub radius_max: f32,
    pub scale_jitter: f32,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            radius_min: SPAWN_RADIUS_MIN,
            radius_max: SPAWN_RADIUS_MAX,
            scale_jitter: SPAWN_SCALE_JITTER,
        }
    }
}

/// All canvas settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub physics: PhysicsSettings,
    pub viewport: Viewport,
    pub placement: PlacementSettings,
    /// Seed for placement jitter and the reference generator
    pub seed: u64,
}

impl Settings {
    /// Bounds derived from the viewport and padding
    pub fn bounds(&self) -> Bounds {
        Bounds::from_viewport(
            self.viewport.width,
            self.viewport.height,
            self.physics.padding,
        )
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CanvasError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file, then apply environment overrides.
    ///
    /// A missing file yields defaults; a present but invalid file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut settings = match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(CanvasError::InvalidSettings(e.to_string())),
        };
        settings.apply_env();
        Ok(settings)
    }

    /// Apply `OPTION_CANVAS_API_URL` if set
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            log::info!("API base URL overridden by {}", API_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
    }

    /// Reject values that would stop the momentum loop from converging
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        if !(p.decay > 0.0 && p.decay < 1.0) {
            return Err(CanvasError::InvalidSettings(format!(
                "physics.decay must be in (0, 1), got {}",
                p.decay
            )));
        }
        if !(0.0..=1.0).contains(&p.bounce_damping) {
            return Err(CanvasError::InvalidSettings(format!(
                "physics.bounce_damping must be in [0, 1], got {}",
                p.bounce_damping
            )));
        }
        if !(p.rest_epsilon > 0.0) {
            return Err(CanvasError::InvalidSettings(
                "physics.rest_epsilon must be positive".to_string(),
            ));
        }
        if !(p.padding.is_finite() && p.padding >= 0.0) {
            return Err(CanvasError::InvalidSettings(format!(
                "physics.padding must be finite and non-negative, got {}",
                p.padding
            )));
        }
        let viewport = &self.viewport;
        if !(viewport.width.is_finite() && viewport.width > 0.0)
            || !(viewport.height.is_finite() && viewport.height > 0.0)
        {
            return Err(CanvasError::InvalidSettings(format!(
                "viewport must be finite and positive, got {}x{}",
                viewport.width, viewport.height
            )));
        }
        let placement = &self.placement;
        if !(placement.radius_min.is_finite()
            && placement.radius_max.is_finite()
            && placement.radius_min >= 0.0
            && placement.radius_min <= placement.radius_max)
        {
            return Err(CanvasError::InvalidSettings(format!(
                "placement radius range [{}, {}] is empty or not finite",
                placement.radius_min, placement.radius_max
            )));
        }
        if !(placement.scale_jitter.is_finite() && placement.scale_jitter >= 0.0) {
            return Err(CanvasError::InvalidSettings(format!(
                "placement.scale_jitter must be finite and non-negative, got {}",
                placement.scale_jitter
            )));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(CanvasError::InvalidSettings(
                "api.request_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

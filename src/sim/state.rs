//! Simulation body and bounds types
//!
//! A body is a plain position + velocity record; it carries no behavior of its own.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A movable entity on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    /// Velocity in canvas units per tick
    pub vel: Vec2,
    /// Cosmetic scale (1.0 = nominal)
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl Body {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Both velocity components are below `epsilon`
    #[inline]
    pub fn is_at_rest(&self, epsilon: f32) -> bool {
        self.vel.x.abs() < epsilon && self.vel.y.abs() < epsilon
    }

    /// Speed (velocity magnitude)
    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Axis-aligned region bodies are kept inside (viewport minus padding)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Bounds for a viewport of `width` x `height` with `padding` on every side.
    ///
    /// An axis narrower than twice the padding collapses to its midpoint.
    pub fn from_viewport(width: f32, height: f32, padding: f32) -> Self {
        let (min_x, max_x) = axis_range(width, padding);
        let (min_y, max_y) = axis_range(height, padding);
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Clamp each axis independently
    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
        )
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

fn axis_range(extent: f32, padding: f32) -> (f32, f32) {
    let lo = padding;
    let hi = extent - padding;
    if lo <= hi {
        (lo, hi)
    } else {
        let mid = extent * 0.5;
        (mid, mid)
    }
}

//! Boundary collision for canvas bodies
//!
//! Walls are the four sides of the padded viewport. Each axis is resolved
//! independently: a body can hit a side wall and the floor on the same tick.

use glam::Vec2;

use super::state::Bounds;

/// Result of a boundary check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    /// Candidate position clamped into bounds
    pub position: Vec2,
    /// Candidate left [min.x, max.x]
    pub hit_x: bool,
    /// Candidate left [min.y, max.y]
    pub hit_y: bool,
}

impl CollisionResult {
    #[inline]
    pub fn hit(&self) -> bool {
        self.hit_x || self.hit_y
    }
}

/// Clamp a candidate position into `bounds`, reporting which axes overshot
pub fn bounds_collision(candidate: Vec2, bounds: &Bounds) -> CollisionResult {
    let hit_x = candidate.x < bounds.min.x || candidate.x > bounds.max.x;
    let hit_y = candidate.y < bounds.min.y || candidate.y > bounds.max.y;
    CollisionResult {
        position: bounds.clamp(candidate),
        hit_x,
        hit_y,
    }
}

/// Reflect one velocity component off a wall, keeping `damping` of its magnitude
#[inline]
pub fn bounce(component: f32, damping: f32) -> f32 {
    -component * damping
}

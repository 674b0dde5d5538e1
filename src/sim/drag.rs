//! Pointer drag gesture
//!
//! While a drag is active the momentum tick does not run for the dragged
//! body. The gesture moves the body by raw pointer deltas and keeps an
//! instantaneous velocity estimate that becomes the release velocity.

use glam::Vec2;

use super::state::Body;

/// An in-progress drag of one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture<K> {
    pub entity: K,
    last_pointer: Vec2,
    velocity: Vec2,
}

impl<K: Copy> DragGesture<K> {
    pub fn begin(entity: K, pointer: Vec2) -> Self {
        Self {
            entity,
            last_pointer: pointer,
            velocity: Vec2::ZERO,
        }
    }

    /// Apply a pointer move to `body`, returning the new position
    pub fn update(&mut self, pointer: Vec2, body: &mut Body, velocity_scale: f32) -> Vec2 {
        let delta = pointer - self.last_pointer;
        self.last_pointer = pointer;
        self.velocity = delta * velocity_scale;
        body.pos += delta;
        body.vel = self.velocity;
        body.pos
    }

    /// Velocity estimate from the most recent pointer move
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }
}

//! Fixed-step momentum tick
//!
//! One call advances one body by one animation frame. The step is purely
//! numerical: no input validation, no failure modes.

use super::collision::{bounce, bounds_collision};
use super::state::{Body, Bounds};
use crate::settings::PhysicsSettings;

/// What the body is doing after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still above the rest threshold on at least one axis
    Moving,
    /// Both velocity components fell below the rest threshold
    AtRest,
}

/// Advance a coasting body by one frame
pub fn tick(body: &mut Body, bounds: &Bounds, physics: &PhysicsSettings) -> TickOutcome {
    let candidate = body.pos + body.vel;
    body.vel *= physics.decay;

    let collision = bounds_collision(candidate, bounds);
    body.pos = collision.position;
    if collision.hit_x {
        body.vel.x = bounce(body.vel.x, physics.bounce_damping);
    }
    if collision.hit_y {
        body.vel.y = bounce(body.vel.y, physics.bounce_damping);
    }

    if body.is_at_rest(physics.rest_epsilon) {
        TickOutcome::AtRest
    } else {
        TickOutcome::Moving
    }
}

/// Tick until the body comes to rest or `max_ticks` elapse.
///
/// Returns the number of ticks run. With a finite velocity and decay < 1 the
/// body always settles; `max_ticks` only guards non-finite input.
pub fn settle(body: &mut Body, bounds: &Bounds, physics: &PhysicsSettings, max_ticks: u32) -> u32 {
    let mut ticks = 0;
    while ticks < max_ticks {
        ticks += 1;
        if tick(body, bounds, physics) == TickOutcome::AtRest {
            break;
        }
    }
    ticks
}

//! Initial placement for freshly generated entities

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Body, Bounds};
use crate::polar_to_cartesian;
use crate::settings::PlacementSettings;

/// RNG seed wrapper so placement can be reproduced
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Bodies for a batch of `count` entities, evenly spaced on a ring around the
/// bounds center at a random radius, with a small scale jitter.
///
/// Positions are clamped into `bounds` so a small viewport never spawns
/// anything off-canvas.
pub fn spawn_ring(
    bounds: &Bounds,
    count: usize,
    placement: &PlacementSettings,
    rng: &mut Pcg32,
) -> Vec<Body> {
    if count == 0 {
        return Vec::new();
    }
    let center = bounds.center();
    let step = TAU / count as f32;
    let (r_min, r_max) = if placement.radius_min <= placement.radius_max {
        (placement.radius_min, placement.radius_max)
    } else {
        (placement.radius_max, placement.radius_min)
    };
    let jitter = placement.scale_jitter.abs();

    (0..count)
        .map(|i| {
            let radius = if r_min < r_max {
                rng.random_range(r_min..=r_max)
            } else {
                r_min
            };
            let scale = if jitter > 0.0 {
                1.0 + rng.random_range(-jitter..=jitter)
            } else {
                1.0
            };
            let pos = polar_to_cartesian(center, radius, i as f32 * step);
            Body::at(bounds.clamp(pos)).with_scale(scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn bounds() -> Bounds {
        Bounds::from_viewport(1600.0, 1000.0, 100.0)
    }

    #[test]
    fn test_ring_radius_and_scale() {
        let placement = PlacementSettings::default();
        let mut rng = RngState::new(3).to_rng();
        let bodies = spawn_ring(&bounds(), 8, &placement, &mut rng);
        assert_eq!(bodies.len(), 8);

        let center = bounds().center();
        for body in &bodies {
            let r = body.pos.distance(center);
            assert!((249.9..=350.1).contains(&r), "radius {r}");
            assert!((0.95..=1.05).contains(&body.scale));
            assert_eq!(body.vel, Vec2::ZERO);
        }
    }

    #[test]
    fn test_ring_angles_evenly_spaced() {
        let placement = PlacementSettings {
            radius_min: 300.0,
            radius_max: 300.0,
            scale_jitter: 0.0,
        };
        let mut rng = RngState::new(0).to_rng();
        let bodies = spawn_ring(&bounds(), 4, &placement, &mut rng);
        let center = bounds().center();
        assert!(bodies[0].pos.abs_diff_eq(center + Vec2::new(300.0, 0.0), 1e-3));
        // Bounds are 800 tall around y=500, so a 300 radius fits vertically
        assert!(bodies[1].pos.abs_diff_eq(center + Vec2::new(0.0, 300.0), 1e-3));
        assert!(bodies.iter().all(|b| b.scale == 1.0));
    }

    #[test]
    fn test_same_seed_same_ring() {
        let placement = PlacementSettings::default();
        let a = spawn_ring(&bounds(), 5, &placement, &mut RngState::new(9).to_rng());
        let b = spawn_ring(&bounds(), 5, &placement, &mut RngState::new(9).to_rng());
        assert_eq!(
            a.iter().map(|b| b.pos).collect::<Vec<_>>(),
            b.iter().map(|b| b.pos).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_small_viewport_clamps() {
        let tight = Bounds::from_viewport(400.0, 300.0, 100.0);
        let bodies = spawn_ring(
            &tight,
            6,
            &PlacementSettings::default(),
            &mut RngState::new(1).to_rng(),
        );
        assert!(bodies.iter().all(|b| tight.contains(b.pos)));
    }

    #[test]
    fn test_empty_batch() {
        let mut rng = RngState::new(0).to_rng();
        assert!(spawn_ring(&bounds(), 0, &PlacementSettings::default(), &mut rng).is_empty());
    }
}

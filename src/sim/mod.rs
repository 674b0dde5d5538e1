//! Deterministic momentum simulation
//!
//! Everything that moves on the canvas lives here. This module must stay pure:
//! - One fixed step per frame, no wall-clock time
//! - Stable iteration order (by entity key)
//! - No network, rendering, or session dependencies

pub mod collision;
pub mod drag;
pub mod placement;
pub mod state;
pub mod store;
pub mod tick;

pub use collision::{CollisionResult, bounds_collision};
pub use drag::DragGesture;
pub use placement::{RngState, spawn_ring};
pub use state::{Body, Bounds};
pub use store::{MomentumTask, Motion, PositionStore};
pub use tick::{TickOutcome, settle, tick};

//! Entity position store
//!
//! Authoritative map from entity key to body. The store also owns the
//! per-entity momentum tasks: a task is live only while its epoch matches the
//! entity's current epoch, so starting a drag or removing the entity
//! invalidates whatever task was running for it.

use std::collections::BTreeMap;
use std::fmt::Debug;

use glam::Vec2;

use super::drag::DragGesture;
use super::state::{Body, Bounds};
use super::tick::{TickOutcome, tick};
use crate::settings::PhysicsSettings;

/// Who currently drives a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Resting,
    Dragging,
    Coasting,
}

/// Handle to a scheduled momentum loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MomentumTask<K> {
    pub entity: K,
    pub epoch: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    body: Body,
    motion: Motion,
    epoch: u64,
}

/// Position store (sorted by key for deterministic stepping)
#[derive(Debug, Clone)]
pub struct PositionStore<K> {
    entries: BTreeMap<K, Entry>,
    /// Scheduled tasks in start order
    tasks: Vec<MomentumTask<K>>,
    drag: Option<DragGesture<K>>,
    bounds: Bounds,
    physics: PhysicsSettings,
    next_epoch: u64,
}

impl<K: Ord + Copy + Debug> PositionStore<K> {
    pub fn new(bounds: Bounds, physics: PhysicsSettings) -> Self {
        Self {
            entries: BTreeMap::new(),
            tasks: Vec::new(),
            drag: None,
            bounds,
            physics,
            next_epoch: 1,
        }
    }

    fn bump_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn physics(&self) -> &PhysicsSettings {
        &self.physics
    }

    /// Place (or replace) a resting body
    pub fn insert(&mut self, key: K, body: Body) {
        let epoch = self.bump_epoch();
        if self.drag.is_some_and(|d| d.entity == key) {
            self.drag = None;
        }
        self.entries.insert(
            key,
            Entry {
                body,
                motion: Motion::Resting,
                epoch,
            },
        );
    }

    /// Drop an entity, cancelling its momentum task and any drag on it
    pub fn remove(&mut self, key: &K) -> Option<Body> {
        let entry = self.entries.remove(key)?;
        if self.drag.is_some_and(|d| d.entity == *key) {
            self.drag = None;
        }
        self.tasks.retain(|t| t.entity != *key);
        Some(entry.body)
    }

    pub fn get(&self, key: &K) -> Option<&Body> {
        self.entries.get(key).map(|e| &e.body)
    }

    pub fn position(&self, key: &K) -> Option<Vec2> {
        self.get(key).map(|b| b.pos)
    }

    pub fn motion(&self, key: &K) -> Option<Motion> {
        self.entries.get(key).map(|e| e.motion)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Body)> {
        self.entries.iter().map(|(k, e)| (k, &e.body))
    }

    pub fn dragging(&self) -> Option<K> {
        self.drag.map(|d| d.entity)
    }

    /// Any body still coasting
    pub fn is_animating(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Whether `task` is still the live momentum loop for its entity
    pub fn is_live(&self, task: &MomentumTask<K>) -> bool {
        self.entries
            .get(&task.entity)
            .is_some_and(|e| e.epoch == task.epoch && e.motion == Motion::Coasting)
    }

    /// Take ownership of a body for dragging.
    ///
    /// Cancels any momentum on it. A drag already in progress on another
    /// entity is released first. Returns false for unknown keys.
    pub fn begin_drag(&mut self, key: K, pointer: Vec2) -> bool {
        if !self.entries.contains_key(&key) {
            return false;
        }
        if self.drag.is_some_and(|d| d.entity != key) {
            self.end_drag();
        }

        let epoch = self.bump_epoch();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.epoch = epoch;
            entry.motion = Motion::Dragging;
            entry.body.vel = Vec2::ZERO;
        }
        self.tasks.retain(|t| t.entity != key);
        self.drag = Some(DragGesture::begin(key, pointer));
        true
    }

    /// Move the dragged body with the pointer, returning its new position
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Vec2> {
        let drag = self.drag.as_mut()?;
        let entry = self.entries.get_mut(&drag.entity)?;
        Some(drag.update(pointer, &mut entry.body, self.physics.drag_velocity_scale))
    }

    /// Release the dragged body.
    ///
    /// The final position is committed as-is (clamped into bounds) and the
    /// last velocity estimate seeds a new momentum task. Returns `None` when
    /// nothing was dragged or the release velocity is already at rest.
    pub fn end_drag(&mut self) -> Option<MomentumTask<K>> {
        let drag = self.drag.take()?;
        let epoch = self.bump_epoch();
        let bounds = self.bounds;
        let rest_epsilon = self.physics.rest_epsilon;
        let entry = self.entries.get_mut(&drag.entity)?;

        entry.epoch = epoch;
        entry.body.pos = bounds.clamp(entry.body.pos);
        let velocity = drag.velocity();
        entry.body.vel = if velocity.is_finite() {
            velocity
        } else {
            Vec2::ZERO
        };

        if entry.body.is_at_rest(rest_epsilon) {
            entry.body.vel = Vec2::ZERO;
            entry.motion = Motion::Resting;
            log::debug!("Released {:?} at rest", drag.entity);
            return None;
        }

        entry.motion = Motion::Coasting;
        let task = MomentumTask {
            entity: drag.entity,
            epoch,
        };
        self.tasks.push(task);
        log::debug!("Released {:?} with velocity {:?}", drag.entity, entry.body.vel);
        Some(task)
    }

    /// Run one animation frame for every live momentum task.
    ///
    /// Tasks that settle (or went stale) are dropped. Returns the number of
    /// bodies still coasting.
    pub fn step(&mut self) -> usize {
        let entries = &mut self.entries;
        let bounds = &self.bounds;
        let physics = &self.physics;

        self.tasks.retain(|task| {
            let Some(entry) = entries.get_mut(&task.entity) else {
                return false;
            };
            if entry.epoch != task.epoch || entry.motion != Motion::Coasting {
                return false;
            }
            match tick(&mut entry.body, bounds, physics) {
                TickOutcome::Moving => true,
                TickOutcome::AtRest => {
                    entry.motion = Motion::Resting;
                    false
                }
            }
        });
        self.tasks.len()
    }

    /// Change the bounds, pulling every body not under the pointer back inside
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        for entry in self.entries.values_mut() {
            if entry.motion != Motion::Dragging {
                entry.body.pos = bounds.clamp(entry.body.pos);
            }
        }
    }
}

//! Secondary per-item motion: a damped spring that lags behind the grid
//! velocity, plus a swing rotation on a second spring.
//!
//! Integration is explicit Euler at frame rate.  Stability needs
//! `0 < damping < 1` and a small spring constant; both are validated when
//! the configuration is built.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::grid::InstanceId;
use super::vec2::{Vec2, VecGuards};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerTuning {
    pub spring: f64,
    pub damping: f64,
    /// Multiplier from grid velocity to target offset.
    pub offset_gain: f64,
    pub rotation_spring: f64,
    pub rotation_damping: f64,
    /// Multiplier from horizontal grid velocity to target rotation (degrees).
    pub swing: f64,
    /// Range of the per-item momentum factor.
    pub factor_min: f64,
    pub factor_max: f64,
}

impl Default for FollowerTuning {
    fn default() -> Self {
        Self {
            spring: 0.08,
            damping: 0.88,
            offset_gain: 2.0,
            rotation_spring: 0.12,
            rotation_damping: 0.85,
            swing: 0.3,
            factor_min: 0.5,
            factor_max: 1.5,
        }
    }
}

/// Spring state owned by one rendered instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemPhysics {
    pub offset: Vec2,
    pub velocity: Vec2,
    pub rotation: f64,
    pub rotation_velocity: f64,
}

/// Visual transform layered on top of the item's fixed grid position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemTransform {
    pub offset: Vec2,
    pub rotation_degrees: f64,
}

#[derive(Debug, Clone)]
pub struct ItemPhysicsFollower {
    physics: ItemPhysics,
    momentum_factor: f64,
}

impl ItemPhysicsFollower {
    pub fn new(momentum_factor: f64) -> Self {
        Self {
            physics: ItemPhysics::default(),
            momentum_factor,
        }
    }

    #[cfg(test)]
    pub fn momentum_factor(&self) -> f64 {
        self.momentum_factor
    }

    pub fn step(&mut self, grid_velocity: &Vec2, tuning: &FollowerTuning) -> ItemTransform {
        let gv = grid_velocity.finite_or_zero();
        let p = &mut self.physics;

        let target_offset = -gv * (self.momentum_factor * tuning.offset_gain);
        let force = (target_offset - p.offset) * tuning.spring;
        p.velocity += force;
        p.velocity = p.velocity * tuning.damping;
        p.offset += p.velocity;

        let target_rotation = -gv.x * self.momentum_factor * tuning.swing;
        let torque = (target_rotation - p.rotation) * tuning.rotation_spring;
        p.rotation_velocity += torque;
        p.rotation_velocity *= tuning.rotation_damping;
        p.rotation += p.rotation_velocity;

        if !p.offset.is_finite() || !p.velocity.is_finite() || !p.rotation.is_finite() {
            *p = ItemPhysics::default();
        }

        self.transform()
    }

    pub fn transform(&self) -> ItemTransform {
        ItemTransform {
            offset: self.physics.offset,
            rotation_degrees: self.physics.rotation,
        }
    }
}

/// Followers for every mounted instance, keyed by instance identity.
///
/// Instances mount when they become visible and unmount (dropping their
/// state) when they leave the view.
#[derive(Debug)]
pub struct FollowerArena {
    tuning: FollowerTuning,
    followers: HashMap<InstanceId, ItemPhysicsFollower>,
    rng: StdRng,
}

impl FollowerArena {
    pub fn new(tuning: FollowerTuning, seed: u64) -> Self {
        Self {
            tuning,
            followers: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.followers.len()
    }

    #[cfg(test)]
    pub fn get(&self, id: &InstanceId) -> Option<&ItemPhysicsFollower> {
        self.followers.get(id)
    }

    fn draw_factor(&mut self) -> f64 {
        let lo = self.tuning.factor_min;
        let hi = self.tuning.factor_max;
        if hi > lo && (hi - lo).is_finite() {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Mount `visible` (creating state for newcomers), unmount everything
    /// else, then step every mounted follower with the shared velocity.
    pub fn step_visible(&mut self, visible: &[InstanceId], grid_velocity: &Vec2) {
        let keep: std::collections::HashSet<InstanceId> = visible.iter().copied().collect();
        self.followers.retain(|id, _| keep.contains(id));
        for id in visible {
            if !self.followers.contains_key(id) {
                let factor = self.draw_factor();
                self.followers.insert(*id, ItemPhysicsFollower::new(factor));
            }
        }
        let tuning = self.tuning;
        for follower in self.followers.values_mut() {
            follower.step(grid_velocity, &tuning);
        }
    }

    pub fn transform(&self, id: &InstanceId) -> ItemTransform {
        self.followers
            .get(id)
            .map(ItemPhysicsFollower::transform)
            .unwrap_or_default()
    }

    /// Shift every instance identity by whole tiles; used after a wrap so
    /// on-screen items keep their spring state.
    pub fn rebase(&mut self, tiles_x: i32, tiles_y: i32) {
        if tiles_x == 0 && tiles_y == 0 {
            return;
        }
        self.followers = self
            .followers
            .drain()
            .map(|(id, f)| {
                let id = InstanceId {
                    tile_x: id.tile_x + tiles_x,
                    tile_y: id.tile_y + tiles_y,
                    item: id.item,
                };
                (id, f)
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.followers.clear();
    }
}

//! Viewport integration: easing toward the input-driven target, release
//! momentum, wheel impulses, and the per-frame grid velocity signal.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::easing::Tween;
use super::vec2::{Vec2, VecGuards};

/// Tunables for [`MomentumIntegrator`].
///
/// Ease convention: each frame `current += (target - current) * ease`, so a
/// larger ease is a more responsive viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationTuning {
    /// Ease fraction while idle or coasting.
    pub ease: f64,
    /// Ease fraction while a drag is in progress.
    pub drag_ease: f64,
    /// Release velocity is multiplied by this to get the throw distance.
    pub momentum_multiplier: f64,
    /// Per-axis cap on the throw distance.
    pub max_momentum: f64,
    /// Duration of the release animation.
    pub release_ms: u64,
    /// Scale applied to raw wheel deltas.
    pub wheel_smoothing: f64,
    /// Per-axis cap on a single wheel event.
    pub wheel_max_delta: f64,
    /// Distance moved per keyboard pan step.
    pub key_pan: f64,
}

impl Default for NavigationTuning {
    fn default() -> Self {
        Self {
            ease: 0.08,
            drag_ease: 0.25,
            momentum_multiplier: 12.0,
            max_momentum: 400.0,
            release_ms: 1000,
            wheel_smoothing: 0.8,
            wheel_max_delta: 40.0,
            key_pan: 120.0,
        }
    }
}

/// `current` is what gets rendered, `target` is where input wants it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport2D {
    pub current: Vec2,
    pub target: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Idle,
    Dragging,
    Coasting,
}

#[derive(Debug, Clone)]
pub struct MomentumIntegrator {
    tuning: NavigationTuning,
    viewport: Viewport2D,
    mode: MotionMode,
    coast: Option<Tween>,
    grid_velocity: Vec2,
    last_finite: Vec2,
}

impl MomentumIntegrator {
    pub fn new(tuning: NavigationTuning, initial: Vec2) -> Self {
        Self {
            tuning,
            viewport: Viewport2D {
                current: initial,
                target: initial,
            },
            mode: MotionMode::Idle,
            coast: None,
            grid_velocity: Vec2::ZERO,
            last_finite: initial,
        }
    }

    pub fn viewport(&self) -> Viewport2D {
        self.viewport
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    /// Frame-to-frame delta of `current`, written once per [`tick`](Self::tick).
    pub fn grid_velocity(&self) -> Vec2 {
        self.grid_velocity
    }

    fn active_ease(&self) -> f64 {
        match self.mode {
            MotionMode::Dragging => self.tuning.drag_ease,
            MotionMode::Idle | MotionMode::Coasting => self.tuning.ease,
        }
    }

    /// Enter drag tracking.  Any coasting animation is dropped outright so
    /// nothing but the pointer writes `target` from here on.
    pub fn begin_drag(&mut self) -> Vec2 {
        self.coast = None;
        self.mode = MotionMode::Dragging;
        self.viewport.target
    }

    /// 1:1 drag tracking.
    pub fn drag_to(&mut self, target: Vec2) {
        if self.mode != MotionMode::Dragging || !target.is_finite() {
            return;
        }
        self.viewport.target = target;
    }

    /// End the drag and throw the viewport with the last velocity sample.
    /// Returns the impulse that was applied.
    pub fn release(&mut self, velocity: Vec2, now: Instant) -> Vec2 {
        self.mode = MotionMode::Idle;
        let velocity = velocity.finite_or_zero();
        if velocity == Vec2::ZERO {
            return Vec2::ZERO;
        }
        let impulse =
            (velocity * self.tuning.momentum_multiplier).clamp_axes(self.tuning.max_momentum);
        let from = self.viewport.target;
        self.coast = Some(Tween::new(
            from,
            from + impulse,
            now,
            Duration::from_millis(self.tuning.release_ms),
        ));
        self.mode = MotionMode::Coasting;
        tracing::debug!(?impulse, "release momentum");
        impulse
    }

    /// Wheel / trackpad scroll.  Cancels coasting and moves `target`
    /// directly; there is no separate momentum phase.
    pub fn wheel(&mut self, delta: Vec2) -> Vec2 {
        let delta = (delta.finite_or_zero() * self.tuning.wheel_smoothing)
            .clamp_axes(self.tuning.wheel_max_delta);
        self.cancel_coast();
        self.viewport.target -= delta;
        delta
    }

    /// Keyboard pan by whole steps in the given direction.
    pub fn nudge(&mut self, steps: Vec2) {
        self.cancel_coast();
        self.viewport.target += steps.finite_or_zero() * self.tuning.key_pan;
    }

    /// Jump the target back to a fixed place; `current` eases there.
    pub fn recenter(&mut self, target: Vec2) {
        self.cancel_coast();
        if self.mode != MotionMode::Dragging {
            self.viewport.target = target;
        }
    }

    pub fn cancel_coast(&mut self) {
        self.coast = None;
        if self.mode == MotionMode::Coasting {
            self.mode = MotionMode::Idle;
        }
    }

    /// Destination of the in-flight release animation, if any.
    #[cfg(test)]
    pub fn coast_destination(&self) -> Option<Vec2> {
        self.coast.map(|t| t.end())
    }

    /// Rebase both coordinates (and an in-flight animation) by `by`.
    /// The rendered offset `current` and the input target move together so
    /// the shift itself produces no visible motion.
    pub fn shift(&mut self, by: Vec2) {
        self.viewport.current += by;
        self.viewport.target += by;
        self.last_finite += by;
        if let Some(coast) = self.coast.as_mut() {
            coast.shift(by);
        }
    }

    /// Advance one frame.  Returns the new grid velocity.
    pub fn tick(&mut self, now: Instant) -> Vec2 {
        if let Some(coast) = self.coast {
            self.viewport.target = coast.sample(now);
            if coast.is_done(now) {
                self.coast = None;
                if self.mode == MotionMode::Coasting {
                    self.mode = MotionMode::Idle;
                }
            }
        }

        if !self.viewport.current.is_finite() {
            tracing::warn!("non-finite viewport position, restoring last good value");
            self.viewport.current = self.last_finite;
        }
        if !self.viewport.target.is_finite() {
            tracing::warn!("non-finite viewport target, holding position");
            self.viewport.target = self.viewport.current;
            self.coast = None;
        }

        let previous = self.viewport.current;
        let ease = self.active_ease().clamp(0.0, 1.0);
        let next = previous + (self.viewport.target - previous) * ease;

        if next.is_finite() {
            self.viewport.current = next;
            self.last_finite = next;
            self.grid_velocity = next - previous;
        } else {
            self.grid_velocity = Vec2::ZERO;
        }
        self.grid_velocity
    }
}

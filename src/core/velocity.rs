//! Pointer velocity estimation.
//!
//! The estimate is simply the delta between the two most recent pointer
//! samples.  No timestamp normalisation and no averaging window: the feel
//! is intentionally tied to the event cadence.

use super::vec2::{Vec2, VecGuards};

#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    last_pointer: Option<Vec2>,
    velocity: Vec2,
}

impl VelocityTracker {
    /// Start a fresh gesture at `pointer`.  Velocity resets to zero.
    pub fn reset(&mut self, pointer: Vec2) {
        self.last_pointer = Some(pointer);
        self.velocity = Vec2::ZERO;
    }

    /// Record a move and return the new velocity sample.
    pub fn sample(&mut self, pointer: Vec2) -> Vec2 {
        if let Some(last) = self.last_pointer {
            self.velocity = (pointer - last).finite_or_zero();
        }
        self.last_pointer = Some(pointer);
        self.velocity
    }

    /// Most recent sample, `(0,0)` if nothing moved since [`reset`](Self::reset).
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_move_means_zero_velocity() {
        let mut t = VelocityTracker::default();
        t.reset(Vec2::new(10.0, 10.0));
        assert_eq!(t.velocity(), Vec2::ZERO);
    }

    #[test]
    fn velocity_is_last_delta_only() {
        let mut t = VelocityTracker::default();
        t.reset(Vec2::ZERO);
        t.sample(Vec2::new(50.0, 0.0));
        let v = t.sample(Vec2::new(55.0, -2.0));
        assert_eq!(v, Vec2::new(5.0, -2.0));
        assert_eq!(t.velocity(), Vec2::new(5.0, -2.0));
    }
}

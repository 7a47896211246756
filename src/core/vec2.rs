//! 2-D vectors for every physics component.
//!
//! World units are "pixels" of the logical canvas; the UI layer converts
//! them to terminal cells.

pub use glam::DVec2 as Vec2;

/// Values below this magnitude are treated as zero by the guards.
pub const EPSILON: f64 = 1e-6;

/// Guards the physics applies to raw input vectors.
pub trait VecGuards {
    /// Per-axis clamp to `[-limit, limit]`.
    fn clamp_axes(self, limit: f64) -> Self;
    /// Replace non-finite components with zero.
    fn finite_or_zero(self) -> Self;
}

impl VecGuards for Vec2 {
    fn clamp_axes(self, limit: f64) -> Self {
        Vec2::new(self.x.clamp(-limit, limit), self.y.clamp(-limit, limit))
    }

    fn finite_or_zero(self) -> Self {
        Vec2::new(
            if self.x.is_finite() { self.x } else { 0.0 },
            if self.y.is_finite() { self.y } else { 0.0 },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_clamp_and_scrub() {
        assert_eq!(Vec2::new(50.0, -90.0).clamp_axes(40.0), Vec2::new(40.0, -40.0));
        assert_eq!(Vec2::new(f64::NAN, 3.0).finite_or_zero(), Vec2::new(0.0, 3.0));
        assert_eq!(Vec2::new(f64::INFINITY, f64::NEG_INFINITY).finite_or_zero(), Vec2::ZERO);
    }
}

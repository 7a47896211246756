//! Infinite-canvas wrapping.
//!
//! The logical position is rebased by whole grid periods whenever the
//! target drifts past `grid_size * factor`.  `current` and `target` always
//! receive the same shift in the same frame, so the rendered translation is
//! continuous across the wrap.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::momentum::MomentumIntegrator;
use super::vec2::{Vec2, EPSILON};

/// Optional conditions that must all hold before a wrap is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapGate {
    /// Maximum `|target - current|` (pending movement).
    pub max_pending: f64,
    /// Maximum grid velocity magnitude, units per frame.
    pub max_speed: f64,
    /// Minimum time between wraps.
    pub min_interval_ms: u64,
}

impl Default for WrapGate {
    fn default() -> Self {
        Self {
            max_pending: 50.0,
            max_speed: 10.0,
            min_interval_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapTuning {
    /// Threshold as a multiple of the grid size (> 1).
    pub factor: f64,
    /// Disabled when `None`: wrapping is unconditional.
    pub gate: Option<WrapGate>,
}

impl Default for WrapTuning {
    fn default() -> Self {
        Self {
            factor: 1.2,
            gate: None,
        }
    }
}

/// What a wrap check did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WrapShift {
    /// Applied shift; zero when nothing wrapped.
    pub shift: Vec2,
}

impl WrapShift {
    pub fn wrapped(&self) -> bool {
        self.shift != Vec2::ZERO
    }
}

#[derive(Debug, Clone)]
pub struct InfiniteTileWrapper {
    tuning: WrapTuning,
    last_wrap: Option<Instant>,
}

/// Signed number of periods to subtract so that `|value| <= threshold`.
fn periods_past(value: f64, threshold: f64, period: f64) -> f64 {
    if period <= EPSILON || threshold <= EPSILON {
        return 0.0;
    }
    if value > threshold {
        ((value - threshold) / period).ceil()
    } else if value < -threshold {
        -((-threshold - value) / period).ceil()
    } else {
        0.0
    }
}

impl InfiniteTileWrapper {
    pub fn new(tuning: WrapTuning) -> Self {
        Self {
            tuning,
            last_wrap: None,
        }
    }

    pub fn threshold(&self, grid_size: Vec2) -> Vec2 {
        grid_size * self.tuning.factor
    }

    fn gate_allows(&self, integrator: &MomentumIntegrator, now: Instant) -> bool {
        let Some(gate) = self.tuning.gate else {
            return true;
        };
        let vp = integrator.viewport();
        let pending = (vp.target - vp.current).length();
        let speed = integrator.grid_velocity().length();
        let rested = self.last_wrap.map_or(true, |at| {
            now.saturating_duration_since(at) >= Duration::from_millis(gate.min_interval_ms)
        });
        pending < gate.max_pending && speed < gate.max_speed && rested
    }

    /// Check the target against the threshold and rebase the integrator if
    /// needed.  Each axis is handled independently.
    pub fn apply(
        &mut self,
        integrator: &mut MomentumIntegrator,
        grid_size: Vec2,
        now: Instant,
    ) -> WrapShift {
        let threshold = self.threshold(grid_size);
        let target = integrator.viewport().target;
        let periods = Vec2::new(
            periods_past(target.x, threshold.x, grid_size.x),
            periods_past(target.y, threshold.y, grid_size.y),
        );
        if periods == Vec2::ZERO || !self.gate_allows(integrator, now) {
            return WrapShift::default();
        }

        let shift = Vec2::new(-periods.x * grid_size.x, -periods.y * grid_size.y);
        integrator.shift(shift);
        self.last_wrap = Some(now);
        tracing::debug!(?shift, "viewport wrapped");
        WrapShift { shift }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::momentum::NavigationTuning;

    fn integrator_at(target: Vec2) -> MomentumIntegrator {
        let mut m = MomentumIntegrator::new(NavigationTuning::default(), Vec2::ZERO);
        m.begin_drag();
        m.drag_to(target);
        m
    }

    #[test]
    fn wraps_by_one_period_past_threshold() {
        let grid = Vec2::new(1000.0, 1000.0);
        let mut m = integrator_at(Vec2::new(1300.0, 0.0));
        let mut w = InfiniteTileWrapper::new(WrapTuning::default());
        let now = Instant::now();

        m.tick(now);
        let before = m.viewport();
        let shift = w.apply(&mut m, grid, now);
        let after = m.viewport();

        assert_eq!(shift.shift, Vec2::new(-1000.0, 0.0));
        assert_eq!(after.target.x, 300.0);
        assert_eq!(after.target.y, 0.0);
        assert_eq!(after.current.x - before.current.x, -1000.0);
        assert_eq!(after.target - before.target, after.current - before.current);
    }

    #[test]
    fn inside_threshold_is_untouched() {
        let grid = Vec2::new(1000.0, 500.0);
        let mut m = integrator_at(Vec2::new(1199.0, -599.0));
        let mut w = InfiniteTileWrapper::new(WrapTuning::default());
        assert!(!w.apply(&mut m, grid, Instant::now()).wrapped());
        assert_eq!(m.viewport().target, Vec2::new(1199.0, -599.0));
    }

    #[test]
    fn negative_and_multi_period_jumps() {
        let grid = Vec2::new(1000.0, 500.0);
        let mut m = integrator_at(Vec2::new(-3500.0, 700.0));
        let mut w = InfiniteTileWrapper::new(WrapTuning::default());
        let shift = w.apply(&mut m, grid, Instant::now());
        assert_eq!(shift.shift, Vec2::new(3000.0, -500.0));
        assert_eq!(m.viewport().target, Vec2::new(-500.0, 200.0));
    }

    #[test]
    fn rendered_position_is_continuous_across_wrap() {
        let grid = Vec2::new(1000.0, 1000.0);
        let mut m = MomentumIntegrator::new(NavigationTuning::default(), Vec2::ZERO);
        let mut w = InfiniteTileWrapper::new(WrapTuning::default());
        let now = Instant::now();
        m.begin_drag();

        // Walk the target steadily rightward; at each wrap the rendered
        // position modulo the grid period must not jump.
        let mut target = 0.0;
        let mut prev_rendered = m.viewport().current.x.rem_euclid(grid.x);
        for _ in 0..500 {
            target += 15.0;
            m.drag_to(Vec2::new(target, 0.0));
            m.tick(now);
            let shift = w.apply(&mut m, grid, now);
            target += shift.shift.x;
            let rendered = m.viewport().current.x.rem_euclid(grid.x);
            let step = (rendered - prev_rendered).rem_euclid(grid.x);
            let step = step.min(grid.x - step);
            assert!(step < 15.0 + 1.0, "visible jump of {step}");
            prev_rendered = rendered;
        }
    }

    #[test]
    fn drift_stays_bounded() {
        let grid = Vec2::new(1000.0, 800.0);
        let mut m = MomentumIntegrator::new(NavigationTuning::default(), Vec2::ZERO);
        let mut w = InfiniteTileWrapper::new(WrapTuning::default());
        let now = Instant::now();
        let threshold = w.threshold(grid);
        let max_step = 40.0;

        for i in 0..20_000 {
            let dir = if (i / 3000) % 2 == 0 { 1.0 } else { -1.0 };
            m.wheel(Vec2::new(-dir * 100.0, -dir * 60.0));
            let v = m.tick(now);
            w.apply(&mut m, grid, now);
            let c = m.viewport().current;
            assert!(c.x.abs() <= threshold.x + max_step + v.x.abs());
            assert!(c.y.abs() <= threshold.y + max_step + v.y.abs());
        }
    }

    #[test]
    fn gate_blocks_fast_motion_and_rapid_repeats() {
        let grid = Vec2::new(1000.0, 1000.0);
        let tuning = WrapTuning {
            factor: 1.2,
            gate: Some(WrapGate::default()),
        };
        let mut w = InfiniteTileWrapper::new(tuning);
        let now = Instant::now();

        // Pending movement is large: blocked.
        let mut m = integrator_at(Vec2::new(1300.0, 0.0));
        assert!(!w.apply(&mut m, grid, now).wrapped());

        // Settled just past the threshold: allowed.
        let mut settled = MomentumIntegrator::new(NavigationTuning::default(), Vec2::new(1250.0, 0.0));
        settled.tick(now);
        assert!(w.apply(&mut settled, grid, now).wrapped());

        // Another settled viewport right after: blocked by the interval.
        let mut again = MomentumIntegrator::new(NavigationTuning::default(), Vec2::new(-1250.0, 0.0));
        again.tick(now);
        assert!(!w.apply(&mut again, grid, now + Duration::from_millis(100)).wrapped());
        assert!(w.apply(&mut again, grid, now + Duration::from_millis(400)).wrapped());
    }
}

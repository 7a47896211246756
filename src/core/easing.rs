//! Time-based tweens used for release momentum.

use std::time::{Duration, Instant};

use super::vec2::Vec2;

/// Decelerating cubic curve (`1 - (1 - t)^3`).
pub fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Animates a [`Vec2`] from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: Vec2,
    to: Vec2,
    start: Instant,
    duration: Duration,
}

impl Tween {
    pub fn new(from: Vec2, to: Vec2, start: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            start,
            duration: duration.max(Duration::from_millis(1)),
        }
    }

    pub fn progress(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn sample(&self, now: Instant) -> Vec2 {
        self.from.lerp(self.to, ease_out_cubic(self.progress(now)))
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }

    #[cfg(test)]
    pub fn end(&self) -> Vec2 {
        self.to
    }

    /// Move both endpoints; used when the wrapper rebases the viewport
    /// mid-animation.
    pub fn shift(&mut self, by: Vec2) {
        self.from += by;
        self.to += by;
    }
}

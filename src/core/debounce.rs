//! Click debouncing as a tiny state machine: `Idle → Cooling(until) → Idle`.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cooldown {
    #[default]
    Idle,
    Cooling { until: Instant },
}

impl Cooldown {
    /// Returns `true` and starts cooling if the trigger is accepted.
    pub fn try_fire(&mut self, now: Instant, window: Duration) -> bool {
        if let Cooldown::Cooling { until } = *self {
            if now < until {
                return false;
            }
        }
        *self = Cooldown::Cooling { until: now + window };
        true
    }

    pub fn is_cooling(&self, now: Instant) -> bool {
        matches!(*self, Cooldown::Cooling { until } if now < until)
    }

    /// Drop back to `Idle` once the window has passed.
    pub fn settle(&mut self, now: Instant) {
        if !self.is_cooling(now) {
            *self = Cooldown::Idle;
        }
    }
}

/// One [`Cooldown`] per key, created on demand.
#[derive(Debug)]
pub struct Debouncer<K> {
    gates: HashMap<K, Cooldown>,
}

impl<K: Eq + Hash + Copy> Debouncer<K> {
    pub fn new() -> Self {
        Self {
            gates: HashMap::new(),
        }
    }

    pub fn try_fire(&mut self, key: K, now: Instant, window: Duration) -> bool {
        self.gates.entry(key).or_default().try_fire(now, window)
    }

    /// Forget keys whose windows have expired.
    pub fn prune(&mut self, now: Instant) {
        self.gates.retain(|_, gate| {
            gate.settle(now);
            *gate != Cooldown::Idle
        });
    }

    pub fn clear(&mut self) {
        self.gates.clear();
    }
}

impl<K: Eq + Hash + Copy> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualClock};

    #[test]
    fn two_clicks_inside_window_fire_once() {
        let clock = ManualClock::new();
        let window = Duration::from_millis(500);
        let mut d = Debouncer::new();
        assert!(d.try_fire(3usize, clock.now(), window));
        clock.advance_ms(499);
        assert!(!d.try_fire(3, clock.now(), window));
    }

    #[test]
    fn two_clicks_beyond_window_fire_twice() {
        let clock = ManualClock::new();
        let window = Duration::from_millis(500);
        let mut d = Debouncer::new();
        assert!(d.try_fire(3usize, clock.now(), window));
        clock.advance_ms(500);
        assert!(d.try_fire(3, clock.now(), window));
    }

    #[test]
    fn keys_are_independent() {
        let clock = ManualClock::new();
        let window = Duration::from_millis(2000);
        let mut d = Debouncer::new();
        assert!(d.try_fire(1usize, clock.now(), window));
        assert!(d.try_fire(2usize, clock.now(), window));
    }

    #[test]
    fn rejected_click_does_not_extend_window() {
        let clock = ManualClock::new();
        let window = Duration::from_millis(500);
        let mut gate = Cooldown::default();
        assert!(gate.try_fire(clock.now(), window));
        clock.advance_ms(300);
        assert!(!gate.try_fire(clock.now(), window));
        clock.advance_ms(200);
        assert!(gate.try_fire(clock.now(), window));
    }

    #[test]
    fn prune_drops_idle_gates() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new();
        d.try_fire(1usize, clock.now(), Duration::from_millis(100));
        clock.advance_ms(150);
        d.prune(clock.now());
        assert!(d.gates.is_empty());
    }
}

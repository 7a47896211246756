//! Registry of one-shot timers owned by the engine.
//!
//! Timers carry a payload and fire from [`TimerRegistry::take_due`], which
//! the frame loop calls once per tick.  Everything still pending is dropped
//! by [`TimerRegistry::cancel_all`] on teardown, so nothing fires against
//! destroyed state.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<T> {
    id: TimerId,
    due: Instant,
    payload: T,
}

#[derive(Debug)]
pub struct TimerRegistry<T> {
    pending: Vec<Pending<T>>,
    next_id: u64,
}

impl<T> TimerRegistry<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) -> TimerId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = TimerId(self.next_id);
        self.pending.push(Pending {
            id,
            due: now + delay,
            payload,
        });
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerId, T)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| (p.due, p.id));
        due.into_iter().map(|p| (p.id, p.payload)).collect()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for TimerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualClock};

    #[test]
    fn fires_in_due_order() {
        let clock = ManualClock::new();
        let mut timers = TimerRegistry::new();
        timers.schedule(clock.now(), Duration::from_millis(300), "late");
        timers.schedule(clock.now(), Duration::from_millis(100), "early");
        clock.advance_ms(50);
        assert!(timers.take_due(clock.now()).is_empty());
        clock.advance_ms(300);
        let fired: Vec<_> = timers.take_due(clock.now()).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert_eq!(timers.len(), 0);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let clock = ManualClock::new();
        let mut timers = TimerRegistry::new();
        let id = timers.schedule(clock.now(), Duration::from_millis(10), 1);
        let kept = timers.schedule(clock.now(), Duration::from_millis(10), 2);
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.is_pending(kept));
        clock.advance_ms(20);
        assert_eq!(timers.take_due(clock.now()), vec![(kept, 2)]);

        timers.schedule(clock.now(), Duration::from_millis(10), 3);
        timers.cancel_all();
        clock.advance_ms(20);
        assert!(timers.take_due(clock.now()).is_empty());
    }
}

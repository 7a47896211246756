//! Short-lived visuals spawned by engine effects: placed stamps, burst
//! particles, wiggling items and sound cues.
//!
//! Everything here lives in view coordinates and expires on its own; the
//! grid moving underneath does not carry stamps or particles along.

use std::time::{Duration, Instant};

use crate::core::behavior::StampKind;
use crate::core::effects::{BurstParticle, EffectRequest};
use crate::core::vec2::Vec2;

/// Stamps fade in, hold, then fade out over their lifetime.
pub const STAMP_FADE_IN: Duration = Duration::from_millis(100);
pub const STAMP_FADE_OUT: Duration = Duration::from_millis(500);
pub const STAMP_LIFETIME: Duration = Duration::from_millis(3150);
pub const PARTICLE_LIFETIME: Duration = Duration::from_millis(1500);
pub const WIGGLE_LIFETIME: Duration = Duration::from_millis(600);
pub const SOUND_CUE_LIFETIME: Duration = Duration::from_millis(900);

#[derive(Debug, Clone)]
pub struct PlacedStamp {
    pub stamp: StampKind,
    pub at: Vec2,
    pub born: Instant,
}

#[derive(Debug, Clone)]
pub struct ActiveBurst {
    pub particles: Vec<BurstParticle>,
    pub born: Instant,
}

impl ActiveBurst {
    /// Particle positions at `now`, or nothing once the burst is over.
    pub fn positions(&self, now: Instant) -> impl Iterator<Item = Vec2> + '_ {
        let t = progress(self.born, now, PARTICLE_LIFETIME);
        self.particles.iter().map(move |p| p.position(t))
    }
}

#[derive(Debug, Default)]
pub struct EffectsOverlay {
    pub stamps: Vec<PlacedStamp>,
    pub bursts: Vec<ActiveBurst>,
    wiggles: Vec<(usize, Instant)>,
    sound_cues: Vec<(usize, Instant)>,
    bell: bool,
}

fn progress(born: Instant, now: Instant, lifetime: Duration) -> f64 {
    (now.saturating_duration_since(born).as_secs_f64() / lifetime.as_secs_f64()).clamp(0.0, 1.0)
}

impl EffectsOverlay {
    /// Take one effect.  Returns announcement text, if the effect carries any.
    pub fn apply(&mut self, effect: EffectRequest, now: Instant) -> Option<String> {
        match effect {
            EffectRequest::Sound { item } => {
                self.sound_cues.push((item, now + SOUND_CUE_LIFETIME));
                self.bell = true;
            }
            EffectRequest::Wiggle { item } => self.wiggles.push((item, now + WIGGLE_LIFETIME)),
            EffectRequest::Burst { particles, .. } => {
                self.bursts.push(ActiveBurst { particles, born: now });
            }
            EffectRequest::Stamp { stamp, at } => {
                self.stamps.push(PlacedStamp { stamp, at, born: now });
            }
            EffectRequest::PlacementStarted { .. } | EffectRequest::PlacementEnded { .. } => {}
            EffectRequest::Announce(text) => return Some(text),
        }
        None
    }

    /// Drop everything whose lifetime has run out.
    pub fn prune(&mut self, now: Instant) {
        self.stamps
            .retain(|s| now.saturating_duration_since(s.born) < STAMP_LIFETIME);
        self.bursts
            .retain(|b| now.saturating_duration_since(b.born) < PARTICLE_LIFETIME);
        self.wiggles.retain(|(_, until)| now < *until);
        self.sound_cues.retain(|(_, until)| now < *until);
    }

    /// Whether a stamp is in its fade-in or fade-out window.
    pub fn stamp_fading(&self, stamp: &PlacedStamp, now: Instant) -> bool {
        let age = now.saturating_duration_since(stamp.born);
        age < STAMP_FADE_IN || age + STAMP_FADE_OUT > STAMP_LIFETIME
    }

    pub fn is_wiggling(&self, item: usize) -> bool {
        self.wiggles.iter().any(|(i, _)| *i == item)
    }

    pub fn has_sound_cue(&self, item: usize) -> bool {
        self.sound_cues.iter().any(|(i, _)| *i == item)
    }

    /// `true` once per sound effect since the last call.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_expire_after_their_lifetimes() {
        let start = Instant::now();
        let mut overlay = EffectsOverlay::default();
        overlay.apply(
            EffectRequest::Stamp {
                stamp: StampKind::Daisy,
                at: Vec2::new(1.0, 2.0),
            },
            start,
        );
        overlay.apply(
            EffectRequest::Burst {
                origin: Vec2::ZERO,
                particles: vec![BurstParticle {
                    start: Vec2::ZERO,
                    target: Vec2::new(100.0, 500.0),
                    peak_y: -250.0,
                }],
            },
            start,
        );
        overlay.apply(EffectRequest::Wiggle { item: 22 }, start);
        assert!(overlay.is_wiggling(22));

        overlay.prune(start + Duration::from_millis(1300));
        assert_eq!(overlay.stamps.len(), 1);
        assert_eq!(overlay.bursts.len(), 1);
        assert!(!overlay.is_wiggling(22));

        overlay.prune(start + Duration::from_millis(1500));
        assert!(overlay.bursts.is_empty());
        assert_eq!(overlay.stamps.len(), 1);

        overlay.prune(start + STAMP_LIFETIME);
        assert!(overlay.stamps.is_empty());
    }

    #[test]
    fn stamps_fade_in_hold_and_fade_out() {
        let start = Instant::now();
        let mut overlay = EffectsOverlay::default();
        overlay.apply(
            EffectRequest::Stamp {
                stamp: StampKind::MapleLeaf,
                at: Vec2::ZERO,
            },
            start,
        );
        let stamp = overlay.stamps[0].clone();
        let at = |ms| start + Duration::from_millis(ms);
        assert!(overlay.stamp_fading(&stamp, at(50)));
        assert!(!overlay.stamp_fading(&stamp, at(100)));
        assert!(!overlay.stamp_fading(&stamp, at(2600)));
        assert!(overlay.stamp_fading(&stamp, at(2700)));
    }

    #[test]
    fn announcements_and_bell_pass_through() {
        let now = Instant::now();
        let mut overlay = EffectsOverlay::default();
        assert_eq!(
            overlay.apply(EffectRequest::Announce("hello".into()), now),
            Some("hello".to_string())
        );
        assert_eq!(overlay.apply(EffectRequest::Sound { item: 0 }, now), None);
        assert!(overlay.has_sound_cue(0));
        assert!(overlay.take_bell());
        assert!(!overlay.take_bell());
    }
}

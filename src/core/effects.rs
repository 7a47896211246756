//! Effect requests emitted by the engine and the velocity-reactive
//! cosmetic helpers.  The engine only decides *what* should happen; the
//! presentation layer decides how it looks.

use std::time::Duration;

use rand::Rng;

use super::behavior::{Capability, ItemBehavior, ItemCatalog, StampKind};
use super::vec2::{Vec2, VecGuards};

/// Number of particles in one burst.
pub const BURST_PARTICLES: usize = 12;

/// A requested side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectRequest {
    /// Play the item's sound cue.
    Sound { item: usize },
    /// Start the pre-burst wiggle on an item.
    Wiggle { item: usize },
    /// Throw a burst of particles.
    Burst { origin: Vec2, particles: Vec<BurstParticle> },
    PlacementStarted { stamp: StampKind },
    PlacementEnded { stamp: StampKind },
    /// Put a stamp down at a screen position.
    Stamp { stamp: StampKind, at: Vec2 },
    /// Text for the status live region.
    Announce(String),
}

/// What a click asks the engine to do.  Anything that needs engine state
/// (timers, placement mode) comes back as an action instead of an effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    Effect(EffectRequest),
    EnterPlacement(StampKind),
    /// Throw a burst from `origin` once `delay` has passed.
    DeferredBurst { delay: Duration, origin: Vec2 },
}

/// Receives item clicks after debouncing.  `world` is the item centre in
/// view coordinates at the time of the click.
pub trait ClickDispatcher {
    fn on_item_click(&mut self, item: usize, world: Vec2) -> Vec<ClickAction>;
}

/// Maps clicks to actions through each item's resolved behaviour.
#[derive(Debug, Clone, Default)]
pub struct BehaviorDispatcher {
    items: Vec<(ItemBehavior, String)>,
}

impl BehaviorDispatcher {
    pub fn from_catalog(catalog: &ItemCatalog) -> Self {
        Self {
            items: catalog
                .iter()
                .map(|item| (item.behavior.clone(), item.description()))
                .collect(),
        }
    }
}

impl ClickDispatcher for BehaviorDispatcher {
    fn on_item_click(&mut self, item: usize, world: Vec2) -> Vec<ClickAction> {
        let Some((behavior, description)) = self.items.get(item) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        for cap in behavior.capabilities {
            match *cap {
                Capability::Sound => actions.push(ClickAction::Effect(EffectRequest::Sound { item })),
                Capability::Stamp(kind) => actions.push(ClickAction::EnterPlacement(kind)),
                Capability::Burst => {
                    actions.push(ClickAction::Effect(EffectRequest::Wiggle { item }));
                    actions.push(ClickAction::DeferredBurst {
                        delay: behavior.click_delay,
                        origin: world,
                    });
                }
                _ => {}
            }
        }
        if behavior.stamp().is_none() {
            actions.push(ClickAction::Effect(EffectRequest::Announce(description.clone())));
        }
        actions
    }
}

/// Trajectory of one burst particle: from `start` up to `peak_y`, then down
/// to `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParticle {
    pub start: Vec2,
    pub target: Vec2,
    pub peak_y: f64,
}

impl BurstParticle {
    /// Position at `t ∈ [0,1]`: linear horizontally, a rise-then-fall arc
    /// vertically.
    pub fn position(&self, t: f64) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let x = self.start.x + (self.target.x - self.start.x) * t;
        let y = if t < 0.4 {
            let k = t / 0.4;
            let eased = 1.0 - (1.0 - k) * (1.0 - k);
            self.start.y + (self.peak_y - self.start.y) * eased
        } else {
            let k = (t - 0.4) / 0.6;
            self.peak_y + (self.target.y - self.peak_y) * k * k
        };
        Vec2::new(x, y)
    }
}

/// Generate a burst centred on `origin`.
pub fn spawn_burst<R: Rng>(rng: &mut R, origin: Vec2) -> Vec<BurstParticle> {
    (0..BURST_PARTICLES)
        .map(|_| {
            let direction: f64 = rng.gen_range(-1.0..1.0);
            let distance: f64 = rng.gen_range(150.0..400.0);
            let fall: f64 = rng.gen_range(400.0..600.0);
            let peak: f64 = rng.gen_range(200.0..350.0);
            BurstParticle {
                start: origin,
                target: Vec2::new(origin.x + direction * distance, origin.y + fall),
                peak_y: origin.y - peak,
            }
        })
        .collect()
}

/// How a velocity-reactive item is feeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentumMood {
    #[default]
    Coasting,
    Forward,
    Backward,
}

impl MomentumMood {
    pub fn label(self) -> &'static str {
        match self {
            MomentumMood::Coasting => "coasting",
            MomentumMood::Forward => "forward",
            MomentumMood::Backward => "backward",
        }
    }
}

const MOOD_THRESHOLD: f64 = 0.5;

/// Classify grid velocity by its dominant axis and compute a tilt in
/// degrees toward the direction of travel.
pub fn momentum_mood(grid_velocity: Vec2) -> (MomentumMood, f64) {
    let v = grid_velocity.finite_or_zero();
    let speed = v.length();
    if speed < MOOD_THRESHOLD {
        return (MomentumMood::Coasting, 0.0);
    }
    let mood = if v.x.abs() > v.y.abs() {
        if v.x > 0.0 { MomentumMood::Forward } else { MomentumMood::Backward }
    } else if v.y > 0.0 {
        MomentumMood::Forward
    } else {
        MomentumMood::Backward
    };
    let angle = v.y.atan2(v.x).to_degrees();
    let intensity = (speed * 3.0).min(15.0);
    let sign = if v.x == 0.0 { 0.0 } else { v.x.signum() };
    (mood, angle * 0.3 + intensity * sign)
}

/// Holographic texture offset accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HoloDrift {
    pub offset: Vec2,
}

impl HoloDrift {
    pub fn step(&mut self, grid_velocity: Vec2) {
        self.offset += grid_velocity.finite_or_zero() * 0.5;
    }
}

/// Peak lean of a hovered tilting card, degrees.
pub const CARD_TILT_DEGREES: f64 = 25.0;
/// Frames in the stop-motion clip, the resting frame included.
pub const STOP_MOTION_FRAMES: usize = 5;
const STOP_MOTION_STEP: Duration = Duration::from_millis(120);

/// Card tilt that eases toward the pointer while hovered and relaxes back
/// to flat once the pointer leaves.  Axes are in `-1..=1`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CardTilt {
    pub lean: Vec2,
}

impl CardTilt {
    pub fn step(&mut self, pointer: Option<Vec2>) {
        match pointer {
            Some(p) => self.lean += (p.clamp_axes(1.0) - self.lean) * 0.1,
            None => self.lean = self.lean * 0.9,
        }
        self.lean = self.lean.finite_or_zero();
    }
}

/// Stop-motion frame after hovering for `hovered`.  The clip plays once
/// and holds its last frame.
pub fn stop_motion_frame(hovered: Duration) -> usize {
    let step = (hovered.as_millis() / STOP_MOTION_STEP.as_millis()) as usize;
    step.min(STOP_MOTION_FRAMES - 1)
}

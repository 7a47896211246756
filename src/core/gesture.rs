//! Pointer gesture routing: press, drag, click and placement mode.
//!
//! The router owns the gesture phase and the active placement mode; it
//! drives the [`MomentumIntegrator`] directly and reports what happened so
//! the engine can run the side effects.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::behavior::StampKind;
use super::grid::InstanceId;
use super::momentum::MomentumIntegrator;
use super::timers::TimerId;
use super::vec2::Vec2;
use super::velocity::VelocityTracker;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Movement (in world units) past which a press becomes a drag.
    pub click_slop: f64,
    /// How long a placement mode stays active.
    pub placement_ms: u64,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            click_slop: 6.0,
            placement_ms: 8000,
        }
    }
}

/// State captured when a drag-capable press begins.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub start_pointer: Vec2,
    pub start_offset: Vec2,
    pub tracker: VelocityTracker,
    /// Item under the pointer at press time.
    pub pressed: Option<InstanceId>,
}

impl DragSession {
    fn begin(pointer: Vec2, integrator: &mut MomentumIntegrator, pressed: Option<InstanceId>) -> Self {
        let start_offset = integrator.begin_drag();
        let mut tracker = VelocityTracker::default();
        tracker.reset(pointer);
        Self {
            start_pointer: pointer,
            start_offset,
            tracker,
            pressed,
        }
    }

    fn track(&mut self, pointer: Vec2, integrator: &mut MomentumIntegrator) {
        self.tracker.sample(pointer);
        integrator.drag_to(self.start_offset + (pointer - self.start_pointer));
    }
}

#[derive(Debug, Clone, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    /// Pointer down, still inside the click slop.
    Pressed(DragSession),
    /// Pointer down after placing a stamp.
    Stamping { press: Vec2 },
    Dragging(DragSession),
}

/// An active placement mode and the timer that will end it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePlacement {
    pub stamp: StampKind,
    pub timer: TimerId,
}

/// What a pointer event turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    None,
    Stamp { stamp: StampKind, at: Vec2 },
    /// Movement crossed the slop.  Carries the placement mode the drag
    /// cancelled, if one was active.
    DragStarted { cancelled: Option<ActivePlacement> },
    Click { instance: InstanceId, pointer: Vec2 },
    Thrown { impulse: Vec2 },
}

#[derive(Debug, Clone, Default)]
pub struct InputGestureRouter {
    tuning: GestureTuning,
    phase: GesturePhase,
    placement: Option<ActivePlacement>,
}

impl InputGestureRouter {
    pub fn new(tuning: GestureTuning) -> Self {
        Self {
            tuning,
            ..Self::default()
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, GesturePhase::Dragging(_))
    }

    pub fn placement(&self) -> Option<ActivePlacement> {
        self.placement
    }

    pub fn press(
        &mut self,
        pointer: Vec2,
        hit: Option<InstanceId>,
        integrator: &mut MomentumIntegrator,
    ) -> GestureEvent {
        if !pointer.is_finite() {
            return GestureEvent::None;
        }
        if let Some(active) = self.placement {
            self.phase = GesturePhase::Stamping { press: pointer };
            return GestureEvent::Stamp {
                stamp: active.stamp,
                at: pointer,
            };
        }
        self.phase = GesturePhase::Pressed(DragSession::begin(pointer, integrator, hit));
        GestureEvent::None
    }

    pub fn move_to(&mut self, pointer: Vec2, integrator: &mut MomentumIntegrator) -> GestureEvent {
        if !pointer.is_finite() {
            return GestureEvent::None;
        }
        let slop = self.tuning.click_slop;
        match &mut self.phase {
            GesturePhase::Idle => GestureEvent::None,
            GesturePhase::Dragging(session) => {
                session.track(pointer, integrator);
                GestureEvent::None
            }
            GesturePhase::Pressed(session) => {
                session.track(pointer, integrator);
                if (pointer - session.start_pointer).length() <= slop {
                    return GestureEvent::None;
                }
                let session = session.clone();
                self.phase = GesturePhase::Dragging(session);
                GestureEvent::DragStarted {
                    cancelled: self.placement.take(),
                }
            }
            GesturePhase::Stamping { press } => {
                if (pointer - *press).length() <= slop {
                    return GestureEvent::None;
                }
                let session = DragSession::begin(pointer, integrator, None);
                self.phase = GesturePhase::Dragging(session);
                GestureEvent::DragStarted {
                    cancelled: self.placement.take(),
                }
            }
        }
    }

    pub fn release(
        &mut self,
        pointer: Vec2,
        integrator: &mut MomentumIntegrator,
        now: Instant,
    ) -> GestureEvent {
        match std::mem::take(&mut self.phase) {
            GesturePhase::Idle | GesturePhase::Stamping { .. } => GestureEvent::None,
            GesturePhase::Pressed(session) => {
                integrator.release(Vec2::ZERO, now);
                match session.pressed {
                    Some(instance) => GestureEvent::Click { instance, pointer },
                    None => GestureEvent::None,
                }
            }
            GesturePhase::Dragging(session) => {
                let impulse = integrator.release(session.tracker.velocity(), now);
                GestureEvent::Thrown { impulse }
            }
        }
    }

    /// Keep an in-progress drag consistent with a viewport rebase.
    pub fn shift(&mut self, by: Vec2) {
        if let GesturePhase::Pressed(session) | GesturePhase::Dragging(session) = &mut self.phase {
            session.start_offset += by;
        }
    }

    /// Drop the current gesture without a click or a throw.
    pub fn abort(&mut self, integrator: &mut MomentumIntegrator, now: Instant) {
        if let GesturePhase::Pressed(_) | GesturePhase::Dragging(_) = std::mem::take(&mut self.phase) {
            integrator.release(Vec2::ZERO, now);
        }
    }

    /// Start (or restart) a placement mode.  Returns the mode it replaced
    /// so its timer can be cancelled.
    pub fn enter_placement(&mut self, stamp: StampKind, timer: TimerId) -> Option<ActivePlacement> {
        self.placement.replace(ActivePlacement { stamp, timer })
    }

    pub fn cancel_placement(&mut self) -> Option<ActivePlacement> {
        self.placement.take()
    }

    /// End the placement mode owned by `timer`.  A stale timer from a mode
    /// that was already replaced does nothing.
    pub fn expire_placement(&mut self, timer: TimerId) -> Option<ActivePlacement> {
        match self.placement {
            Some(active) if active.timer == timer => self.placement.take(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::momentum::{MotionMode, NavigationTuning};
    use crate::core::timers::TimerRegistry;
    use std::time::Duration;

    fn setup() -> (InputGestureRouter, MomentumIntegrator) {
        (
            InputGestureRouter::new(GestureTuning::default()),
            MomentumIntegrator::new(NavigationTuning::default(), Vec2::new(100.0, 0.0)),
        )
    }

    fn item() -> InstanceId {
        InstanceId { tile_x: 0, tile_y: 0, item: 3 }
    }

    #[test]
    fn press_and_release_in_place_is_a_click() {
        let (mut router, mut m) = setup();
        let now = Instant::now();
        router.press(Vec2::new(50.0, 50.0), Some(item()), &mut m);
        assert_eq!(m.mode(), MotionMode::Dragging);
        router.move_to(Vec2::new(53.0, 52.0), &mut m);
        let event = router.release(Vec2::new(53.0, 52.0), &mut m, now);
        assert_eq!(
            event,
            GestureEvent::Click {
                instance: item(),
                pointer: Vec2::new(53.0, 52.0)
            }
        );
        assert_eq!(m.mode(), MotionMode::Idle);
        assert_eq!(m.coast_destination(), None);
    }

    #[test]
    fn drag_tracks_pointer_and_throws_on_release() {
        let (mut router, mut m) = setup();
        let now = Instant::now();
        router.press(Vec2::new(0.0, 0.0), Some(item()), &mut m);
        assert!(matches!(
            router.move_to(Vec2::new(10.0, 0.0), &mut m),
            GestureEvent::DragStarted { cancelled: None }
        ));
        router.move_to(Vec2::new(30.0, 0.0), &mut m);
        assert_eq!(m.viewport().target, Vec2::new(130.0, 0.0));

        let event = router.release(Vec2::new(30.0, 0.0), &mut m, now);
        assert_eq!(event, GestureEvent::Thrown { impulse: Vec2::new(240.0, 0.0) });
        assert_eq!(m.coast_destination(), Some(Vec2::new(370.0, 0.0)));
    }

    #[test]
    fn press_during_placement_stamps_instead_of_dragging() {
        let (mut router, mut m) = setup();
        let mut timers = TimerRegistry::new();
        let id = timers.schedule(Instant::now(), Duration::from_secs(8), ());
        router.enter_placement(StampKind::Daisy, id);

        let event = router.press(Vec2::new(5.0, 5.0), Some(item()), &mut m);
        assert_eq!(
            event,
            GestureEvent::Stamp {
                stamp: StampKind::Daisy,
                at: Vec2::new(5.0, 5.0)
            }
        );
        assert_eq!(m.mode(), MotionMode::Idle);
        assert!(router.placement().is_some());
        assert_eq!(router.release(Vec2::new(5.0, 5.0), &mut m, Instant::now()), GestureEvent::None);
    }

    #[test]
    fn dragging_after_a_stamp_cancels_placement() {
        let (mut router, mut m) = setup();
        let mut timers = TimerRegistry::new();
        let id = timers.schedule(Instant::now(), Duration::from_secs(8), ());
        router.enter_placement(StampKind::MapleLeaf, id);

        router.press(Vec2::new(0.0, 0.0), None, &mut m);
        let event = router.move_to(Vec2::new(20.0, 0.0), &mut m);
        assert_eq!(
            event,
            GestureEvent::DragStarted {
                cancelled: Some(ActivePlacement {
                    stamp: StampKind::MapleLeaf,
                    timer: id
                })
            }
        );
        assert!(router.placement().is_none());
        assert!(router.is_dragging());

        // The drag starts where the slop was crossed.
        router.move_to(Vec2::new(25.0, 0.0), &mut m);
        assert_eq!(m.viewport().target, Vec2::new(105.0, 0.0));
    }

    #[test]
    fn shift_keeps_drag_continuous() {
        let (mut router, mut m) = setup();
        router.press(Vec2::ZERO, None, &mut m);
        router.move_to(Vec2::new(-50.0, 0.0), &mut m);
        m.shift(Vec2::new(1000.0, 0.0));
        router.shift(Vec2::new(1000.0, 0.0));
        router.move_to(Vec2::new(-60.0, 0.0), &mut m);
        assert_eq!(m.viewport().target, Vec2::new(1040.0, 0.0));
    }

    #[test]
    fn stale_placement_timer_is_ignored() {
        let (mut router, _) = setup();
        let mut timers = TimerRegistry::new();
        let now = Instant::now();
        let first = timers.schedule(now, Duration::from_secs(8), ());
        let second = timers.schedule(now, Duration::from_secs(8), ());
        router.enter_placement(StampKind::Daisy, first);
        let replaced = router.enter_placement(StampKind::Daisy, second);
        assert_eq!(replaced.map(|p| p.timer), Some(first));

        assert_eq!(router.expire_placement(first), None);
        assert!(router.placement().is_some());
        assert!(router.expire_placement(second).is_some());
        assert!(router.placement().is_none());
    }

    #[test]
    fn press_on_empty_space_never_clicks() {
        let (mut router, mut m) = setup();
        router.press(Vec2::new(1.0, 1.0), None, &mut m);
        assert_eq!(router.release(Vec2::new(1.0, 1.0), &mut m, Instant::now()), GestureEvent::None);
    }
}

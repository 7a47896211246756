//! The frame scheduler that ties navigation, wrapping, per-item physics,
//! gestures and click effects together.
//!
//! Everything runs on the caller's thread.  Input handlers mutate the
//! engine, [`GridEngine::tick`] advances one frame, and the renderer reads
//! the result.  Side effects queue up as [`EffectRequest`]s until drained.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::behavior::{Capability, ItemCatalog, StampKind, DEFAULT_CLICK_COOLDOWN};
use super::debounce::Debouncer;
use super::effects::{
    self, BehaviorDispatcher, CardTilt, ClickAction, ClickDispatcher, EffectRequest, HoloDrift,
    MomentumMood, CARD_TILT_DEGREES,
};
use super::follower::{FollowerArena, FollowerTuning, ItemTransform};
use super::gesture::{ActivePlacement, GestureEvent, GestureTuning, InputGestureRouter};
use super::grid::{InstanceId, LayoutTuning, TileGrid};
use super::momentum::{MomentumIntegrator, MotionMode, NavigationTuning};
use super::timers::TimerRegistry;
use super::vec2::{Vec2, VecGuards};
use super::wrap::{InfiniteTileWrapper, WrapTuning};

/// Padding between the view edge and the first cell at start-up.
const HOME_PADDING: f64 = 40.0;
/// Overlapping bursts are refused for this long after one starts.
const BURST_GUARD: Duration = Duration::from_millis(100);
/// Staggered entrance: per-item delay and fade length.
const ENTRANCE_STAGGER: Duration = Duration::from_millis(30);
const ENTRANCE_FADE: Duration = Duration::from_millis(400);

/// All engine tunables, one field per config section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineTuning {
    pub navigation: NavigationTuning,
    pub layout: LayoutTuning,
    pub wrap: WrapTuning,
    pub follower: FollowerTuning,
    pub gesture: GestureTuning,
}

/// The instance under a pointer that has no button held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    pub instance: InstanceId,
    /// Pointer relative to the cell centre, each axis in `-1..=1`.
    pub at: Vec2,
    pub since: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerEvent {
    PlacementExpired,
    Burst { origin: Vec2 },
    BurstSettled,
}

pub struct GridEngine {
    tuning: EngineTuning,
    integrator: MomentumIntegrator,
    wrapper: InfiniteTileWrapper,
    grid: TileGrid,
    view: Vec2,
    followers: FollowerArena,
    router: InputGestureRouter,
    debouncer: Debouncer<usize>,
    cooldowns: Vec<Duration>,
    dispatcher: Box<dyn ClickDispatcher>,
    timers: TimerRegistry<TimerEvent>,
    effects: Vec<EffectRequest>,
    rng: StdRng,
    burst_in_flight: bool,
    holo: Vec<Option<HoloDrift>>,
    mood: (MomentumMood, f64),
    visible: Vec<InstanceId>,
    focus: Option<InstanceId>,
    hover: Option<Hover>,
    cards: Vec<Option<CardTilt>>,
    reduced_motion: bool,
    entrance: Option<Instant>,
}

impl GridEngine {
    /// Build an engine for `catalog` shown in a `view`-sized viewport
    /// (world units).  The viewport starts at [`home`](Self::home).
    pub fn new(catalog: &ItemCatalog, tuning: EngineTuning, view: Vec2, seed: u64) -> Self {
        let grid = TileGrid::layout(catalog.len(), view.y, &tuning.layout);
        let home = home_offset(&grid);
        Self {
            tuning,
            integrator: MomentumIntegrator::new(tuning.navigation, home),
            wrapper: InfiniteTileWrapper::new(tuning.wrap),
            grid,
            view,
            followers: FollowerArena::new(tuning.follower, seed),
            router: InputGestureRouter::new(tuning.gesture),
            debouncer: Debouncer::new(),
            cooldowns: catalog.iter().map(|i| i.behavior.click_cooldown).collect(),
            dispatcher: Box::new(BehaviorDispatcher::from_catalog(catalog)),
            timers: TimerRegistry::new(),
            effects: Vec::new(),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            burst_in_flight: false,
            holo: catalog
                .iter()
                .map(|i| i.behavior.has(Capability::Holographic).then(HoloDrift::default))
                .collect(),
            mood: (MomentumMood::Coasting, 0.0),
            visible: Vec::new(),
            focus: None,
            hover: None,
            cards: catalog
                .iter()
                .map(|i| i.behavior.has(Capability::Tilt).then(CardTilt::default))
                .collect(),
            reduced_motion: false,
            entrance: None,
        }
    }

    /// Replace the click dispatcher.
    #[cfg(test)]
    pub fn with_dispatcher(mut self, dispatcher: Box<dyn ClickDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
        if reduced {
            self.followers.clear();
        }
    }

    // ───── read side ─────

    #[cfg(test)]
    pub fn viewport(&self) -> super::momentum::Viewport2D {
        self.integrator.viewport()
    }

    #[cfg(test)]
    pub fn grid_velocity(&self) -> Vec2 {
        self.integrator.grid_velocity()
    }

    pub fn mode(&self) -> MotionMode {
        self.integrator.mode()
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    #[cfg(test)]
    pub fn view(&self) -> Vec2 {
        self.view
    }

    /// Start-up offset: half a cell plus padding on each axis.
    pub fn home(&self) -> Vec2 {
        home_offset(&self.grid)
    }

    pub fn placement(&self) -> Option<StampKind> {
        self.router.placement().map(|p| p.stamp)
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.router.is_dragging()
    }

    /// Instances mounted this frame, in reading order.
    pub fn visible(&self) -> &[InstanceId] {
        &self.visible
    }

    pub fn item_transform(&self, id: &InstanceId) -> ItemTransform {
        if self.reduced_motion {
            return ItemTransform::default();
        }
        self.followers.transform(id)
    }

    /// Top-left of an instance in view coordinates, follower offset included.
    pub fn instance_position(&self, id: InstanceId) -> Vec2 {
        self.grid.instance_origin(id) + self.integrator.viewport().current + self.item_transform(&id).offset
    }

    /// Mood and tilt (degrees) for velocity-reactive items.
    pub fn mood(&self) -> (MomentumMood, f64) {
        self.mood
    }

    /// Texture offset of a holographic item.
    pub fn holo_offset(&self, item: usize) -> Option<Vec2> {
        self.holo.get(item).copied().flatten().map(|h| h.offset)
    }

    pub fn focus(&self) -> Option<InstanceId> {
        self.focus
    }

    pub fn hovered(&self) -> Option<InstanceId> {
        self.hover.map(|h| h.instance)
    }

    /// Lean of a tilting card in degrees around (vertical, horizontal)
    /// axes; `None` for items that do not tilt.
    pub fn card_tilt(&self, item: usize) -> Option<Vec2> {
        let card = self.cards.get(item).copied().flatten()?;
        if self.reduced_motion {
            return Some(Vec2::ZERO);
        }
        Some(card.lean * CARD_TILT_DEGREES)
    }

    /// Stop-motion frame for `item`: it plays while the item is hovered
    /// and rewinds to the first frame when the pointer leaves.
    pub fn stop_motion_frame(&self, item: usize, now: Instant) -> usize {
        match self.hover {
            Some(h) if h.instance.item == item && !self.reduced_motion => {
                effects::stop_motion_frame(now.saturating_duration_since(h.since))
            }
            _ => 0,
        }
    }

    #[cfg(test)]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[cfg(test)]
    pub fn followers(&self) -> &FollowerArena {
        &self.followers
    }

    /// Start the staggered entrance, normally once assets are ready.
    pub fn reveal(&mut self, now: Instant) {
        self.entrance.get_or_insert(now);
    }

    /// Entrance progress of `item` in `[0,1]`; `0` until [`reveal`](Self::reveal).
    pub fn entrance_progress(&self, item: usize, now: Instant) -> f64 {
        let Some(start) = self.entrance else {
            return 0.0;
        };
        if self.reduced_motion {
            return 1.0;
        }
        let delay = ENTRANCE_STAGGER * item.min(u32::MAX as usize) as u32;
        let elapsed = now.saturating_duration_since(start).saturating_sub(delay);
        (elapsed.as_secs_f64() / ENTRANCE_FADE.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn drain_effects(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.effects)
    }

    // ───── input ─────

    pub fn pointer_down(&mut self, pointer: Vec2, now: Instant) {
        let hit = self.hit(pointer);
        let event = self.router.press(pointer, hit, &mut self.integrator);
        self.on_gesture(event, now);
    }

    pub fn pointer_move(&mut self, pointer: Vec2, now: Instant) {
        let event = self.router.move_to(pointer, &mut self.integrator);
        self.on_gesture(event, now);
    }

    pub fn pointer_up(&mut self, pointer: Vec2, now: Instant) {
        let event = self.router.release(pointer, &mut self.integrator, now);
        self.on_gesture(event, now);
    }

    /// Pointer moved with no button held.
    pub fn pointer_hover(&mut self, pointer: Vec2, now: Instant) {
        if self.router.is_dragging() {
            return;
        }
        let Some(instance) = self.hit(pointer) else {
            self.hover = None;
            return;
        };
        let half = self.grid.cell * 0.5;
        let centre = self.grid.instance_origin(instance) + self.integrator.viewport().current + half;
        let at = Vec2::new((pointer.x - centre.x) / half.x, (pointer.y - centre.y) / half.y)
            .clamp_axes(1.0)
            .finite_or_zero();
        let since = match self.hover {
            Some(h) if h.instance == instance => h.since,
            _ => now,
        };
        self.hover = Some(Hover { instance, at, since });
    }

    /// Pointer left the grid.
    pub fn pointer_leave(&mut self) {
        self.hover = None;
    }

    /// Pointer capture lost (focus change, resize mid-drag).
    pub fn pointer_cancel(&mut self, now: Instant) {
        self.router.abort(&mut self.integrator, now);
    }

    pub fn wheel(&mut self, delta: Vec2) {
        if self.router.is_dragging() {
            return;
        }
        self.integrator.wheel(delta);
    }

    pub fn nudge(&mut self, steps: Vec2) {
        if self.router.is_dragging() {
            return;
        }
        self.integrator.nudge(steps);
    }

    pub fn recenter(&mut self) {
        let home = self.home();
        self.integrator.recenter(home);
    }

    /// Esc.  Returns `true` if a placement mode was active.
    pub fn cancel_placement(&mut self) -> bool {
        match self.router.cancel_placement() {
            Some(active) => {
                self.end_placement(active);
                true
            }
            None => false,
        }
    }

    /// Move keyboard focus to the next visible item, wrapping around.
    pub fn focus_next(&mut self) -> Option<InstanceId> {
        let next = match self.focus.and_then(|f| self.visible.iter().position(|v| *v == f)) {
            Some(i) => self.visible.get((i + 1) % self.visible.len().max(1)).copied(),
            None => self.visible.first().copied(),
        };
        self.focus = next;
        next
    }

    /// Enter/Space on the focused item: a stamp while placing, a click
    /// otherwise.
    pub fn activate_focused(&mut self, now: Instant) {
        let Some(id) = self.focus.filter(|f| self.visible.contains(f)) else {
            return;
        };
        match self.router.placement() {
            Some(active) => {
                let at = self.instance_position(id) + self.grid.cell * 0.5;
                self.effects.push(EffectRequest::Stamp { stamp: active.stamp, at });
            }
            None => self.click(id, now),
        }
    }

    /// New viewport size.  The grid is laid out again; the viewport offset
    /// is left alone.
    pub fn resize(&mut self, view: Vec2) {
        if !view.is_finite() || view == self.view {
            return;
        }
        self.view = view;
        self.grid = TileGrid::layout(self.grid.item_count, view.y, &self.tuning.layout);
        tracing::debug!(?view, grid = ?self.grid.grid_size(), "relayout");
    }

    // ───── frame ─────

    /// Advance one frame: due timers, the integrator, the wrapper, then the
    /// followers.  Returns the grid velocity of this frame.
    pub fn tick(&mut self, now: Instant) -> Vec2 {
        for (id, event) in self.timers.take_due(now) {
            match event {
                TimerEvent::PlacementExpired => {
                    if let Some(active) = self.router.expire_placement(id) {
                        self.end_placement(active);
                    }
                }
                TimerEvent::Burst { origin } => self.burst(origin, now),
                TimerEvent::BurstSettled => self.burst_in_flight = false,
            }
        }

        let velocity = self.integrator.tick(now);

        let shift = self.wrapper.apply(&mut self.integrator, self.grid.grid_size(), now);
        if shift.wrapped() {
            let size = self.grid.grid_size();
            let tiles_x = (-shift.shift.x / size.x).round() as i32;
            let tiles_y = (-shift.shift.y / size.y).round() as i32;
            self.followers.rebase(tiles_x, tiles_y);
            self.router.shift(shift.shift);
            for id in self.focus.iter_mut().chain(self.hover.iter_mut().map(|h| &mut h.instance)) {
                id.tile_x += tiles_x;
                id.tile_y += tiles_y;
            }
        }

        let current = self.integrator.viewport().current;
        self.visible = self.grid.visible_instances(current, self.view);
        let grid = self.grid;
        self.visible.sort_by(|a, b| {
            let (pa, pb) = (grid.instance_origin(*a), grid.instance_origin(*b));
            pa.y.total_cmp(&pb.y).then(pa.x.total_cmp(&pb.x))
        });
        if !self.reduced_motion {
            self.followers.step_visible(&self.visible, &velocity);
        }

        for holo in self.holo.iter_mut().flatten() {
            holo.step(velocity);
        }
        let hover = self.hover;
        for (item, card) in self.cards.iter_mut().enumerate() {
            if let Some(card) = card {
                card.step(hover.filter(|h| h.instance.item == item).map(|h| h.at));
            }
        }
        self.mood = effects::momentum_mood(velocity);
        if self.reduced_motion {
            self.mood.1 = 0.0;
        }

        self.debouncer.prune(now);
        velocity
    }

    /// Tear down: every pending timer is cancelled and transient state
    /// dropped.
    pub fn shutdown(&mut self) {
        let pending = self.timers.len();
        self.timers.cancel_all();
        self.router.cancel_placement();
        self.hover = None;
        self.followers.clear();
        self.debouncer.clear();
        self.effects.clear();
        self.burst_in_flight = false;
        tracing::info!(pending, "engine shut down");
    }

    // ───── internals ─────

    fn hit(&self, pointer: Vec2) -> Option<InstanceId> {
        self.grid.hit_test(pointer - self.integrator.viewport().current)
    }

    fn on_gesture(&mut self, event: GestureEvent, now: Instant) {
        match event {
            GestureEvent::None => {}
            GestureEvent::Stamp { stamp, at } => {
                self.effects.push(EffectRequest::Stamp { stamp, at });
            }
            GestureEvent::DragStarted { cancelled } => {
                tracing::debug!("drag started");
                self.hover = None;
                if let Some(active) = cancelled {
                    self.end_placement(active);
                }
            }
            GestureEvent::Click { instance, .. } => self.click(instance, now),
            GestureEvent::Thrown { .. } => {}
        }
    }

    fn click(&mut self, instance: InstanceId, now: Instant) {
        let item = instance.item;
        let window = self.cooldowns.get(item).copied().unwrap_or(DEFAULT_CLICK_COOLDOWN);
        if !self.debouncer.try_fire(item, now, window) {
            tracing::debug!(item, "click ignored during cooldown");
            return;
        }
        let centre = self.instance_position(instance) + self.grid.cell * 0.5;
        for action in self.dispatcher.on_item_click(item, centre) {
            match action {
                ClickAction::Effect(effect) => self.effects.push(effect),
                ClickAction::EnterPlacement(stamp) => self.enter_placement(stamp, now),
                ClickAction::DeferredBurst { delay, origin } => {
                    self.timers.schedule(now, delay, TimerEvent::Burst { origin });
                }
            }
        }
    }

    fn enter_placement(&mut self, stamp: StampKind, now: Instant) {
        let duration = Duration::from_millis(self.tuning.gesture.placement_ms);
        let timer = self.timers.schedule(now, duration, TimerEvent::PlacementExpired);
        let previous = self.router.enter_placement(stamp, timer);
        if let Some(prev) = previous {
            self.timers.cancel(prev.timer);
            if prev.stamp == stamp {
                tracing::debug!(stamp = stamp.label(), "placement timer restarted");
                return;
            }
            self.effects.push(EffectRequest::PlacementEnded { stamp: prev.stamp });
        }
        tracing::info!(stamp = stamp.label(), "placement mode on");
        self.effects.push(EffectRequest::PlacementStarted { stamp });
        self.effects.push(EffectRequest::Announce(format!(
            "{} stamp mode activated. Click anywhere to place {}.",
            stamp.label(),
            stamp.plural()
        )));
    }

    fn end_placement(&mut self, active: ActivePlacement) {
        self.timers.cancel(active.timer);
        tracing::info!(stamp = active.stamp.label(), "placement mode off");
        self.effects.push(EffectRequest::PlacementEnded { stamp: active.stamp });
        self.effects.push(EffectRequest::Announce(format!(
            "{} stamp mode deactivated.",
            active.stamp.label()
        )));
    }

    fn burst(&mut self, origin: Vec2, now: Instant) {
        if self.burst_in_flight {
            tracing::debug!("burst already in flight");
            return;
        }
        let particles = effects::spawn_burst(&mut self.rng, origin);
        self.effects.push(EffectRequest::Burst { origin, particles });
        self.burst_in_flight = true;
        self.timers.schedule(now, BURST_GUARD, TimerEvent::BurstSettled);
    }
}

fn home_offset(grid: &TileGrid) -> Vec2 {
    grid.cell * 0.5 + Vec2::new(HOME_PADDING, HOME_PADDING)
}

//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::core::assets::PetAsset;
use crate::core::behavior::ItemCatalog;
use crate::core::engine::GridEngine;
use crate::core::vec2::Vec2;
use crate::ui::grid_widget::{tile_interior, ThumbCache};
use crate::ui::layout::GridLayout;

use super::asset_runtime::AssetUpdate;
use super::overlay::EffectsOverlay;

/// How long an announcement stays in the status bar.
const ANNOUNCEMENT_TTL: Duration = Duration::from_secs(4);

/// Preload progress as shown on the loading screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub progress: u8,
    pub ready: bool,
    /// Assets replaced by a placeholder.
    pub placeholders: usize,
}

#[derive(Debug, Clone)]
pub struct Announcement {
    pub text: String,
    pub at: Instant,
}

/// Top-level application state.
pub struct AppState {
    /// Navigation, physics and gesture engine.
    pub engine: GridEngine,
    pub catalog: ItemCatalog,
    /// Decoded assets by item index; `None` until loaded.
    pub assets: Vec<Option<PetAsset>>,
    /// Resized thumbnails for the current tile size.
    pub thumbs: ThumbCache,
    pub loading: LoadingState,
    /// Stamps, particles and other transient visuals.
    pub overlay: EffectsOverlay,
    /// Most recent live-region message.
    pub announcement: Option<Announcement>,
    pub config: AppConfig,
    /// Full terminal area, updated on resize.
    pub terminal_area: Rect,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// Frame counter (drives the loading spinner).
    pub frame: u64,
}

impl AppState {
    pub fn new(catalog: ItemCatalog, config: AppConfig, terminal_area: Rect, seed: u64) -> Self {
        let view = GridLayout::split(terminal_area).view_size(&config.display);
        let mut engine = GridEngine::new(&catalog, config.tuning, view, seed);
        engine.set_reduced_motion(config.display.reduced_motion);
        Self {
            engine,
            assets: vec![None; catalog.len()],
            catalog,
            thumbs: ThumbCache::default(),
            loading: LoadingState::default(),
            overlay: EffectsOverlay::default(),
            announcement: None,
            config,
            terminal_area,
            should_quit: false,
            frame: 0,
        }
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout::split(self.terminal_area)
    }

    pub fn world_from_cell(&self, col: u16, row: u16) -> Vec2 {
        self.layout().world_from_cell(col, row, &self.config.display)
    }

    pub fn resize(&mut self, width: u16, height: u16, now: Instant) {
        self.terminal_area = Rect::new(0, 0, width, height);
        self.engine.pointer_cancel(now);
        let view = self.layout().view_size(&self.config.display);
        self.engine.resize(view);
    }

    pub fn announce(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        tracing::debug!(%text, "announce");
        self.announcement = Some(Announcement { text, at: now });
    }

    /// Announcement text if it is still fresh.
    pub fn live_announcement(&self, now: Instant) -> Option<&str> {
        self.announcement
            .as_ref()
            .filter(|a| now.saturating_duration_since(a.at) < ANNOUNCEMENT_TTL)
            .map(|a| a.text.as_str())
    }

    pub fn apply_asset_update(&mut self, update: AssetUpdate, now: Instant) {
        match update {
            AssetUpdate::Progress(pct) => self.loading.progress = pct,
            AssetUpdate::Loaded { index, asset } => {
                if asset.is_placeholder() {
                    self.loading.placeholders += 1;
                }
                if let Some(slot) = self.assets.get_mut(index) {
                    *slot = Some(asset);
                }
            }
            AssetUpdate::Ready => {
                self.loading.ready = true;
                self.loading.progress = 100;
                self.engine.reveal(now);
                let message = match self.loading.placeholders {
                    0 => format!("{} pets loaded. Drag to explore.", self.catalog.len()),
                    n => format!(
                        "{} pets loaded ({n} shown as placeholders). Drag to explore.",
                        self.catalog.len()
                    ),
                };
                self.announce(message, now);
            }
        }
    }

    /// Advance one frame and route the effects it produced.
    pub fn tick(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        if !self.loading.ready {
            return;
        }
        self.engine.tick(now);
        for effect in self.engine.drain_effects() {
            if let Some(text) = self.overlay.apply(effect, now) {
                self.announce(text, now);
            }
        }
        self.overlay.prune(now);
    }

    /// Fit newly loaded thumbnails to the current tile size.
    pub fn prepare_thumbnails(&mut self) {
        let (cols, rows) = tile_interior(&self.engine, &self.config.display);
        self.thumbs.prepare(&self.assets, cols, rows);
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
        self.overlay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn state() -> AppState {
        let catalog = ItemCatalog::builtin(Path::new("pets"));
        AppState::new(catalog, AppConfig::default(), Rect::new(0, 0, 100, 26), 3)
    }

    #[test]
    fn cells_map_to_world_units() {
        let s = state();
        assert_eq!(s.layout().grid, Rect::new(0, 0, 100, 25));
        assert_eq!(s.world_from_cell(0, 0), Vec2::new(4.0, 8.0));
        assert_eq!(s.world_from_cell(10, 2), Vec2::new(84.0, 40.0));
        assert_eq!(s.engine.view(), Vec2::new(800.0, 400.0));
    }

    #[test]
    fn nothing_moves_until_assets_are_ready() {
        let mut s = state();
        let now = Instant::now();
        s.engine.wheel(Vec2::new(0.0, 40.0));
        s.tick(now);
        assert_eq!(s.engine.viewport().current, s.engine.home());

        s.apply_asset_update(AssetUpdate::Loaded { index: 1, asset: PetAsset::placeholder() }, now);
        s.apply_asset_update(AssetUpdate::Ready, now);
        assert!(s.loading.ready);
        assert_eq!(s.loading.placeholders, 1);
        assert!(s.live_announcement(now).unwrap().contains("placeholders"));

        s.tick(now);
        assert_ne!(s.engine.viewport().current, s.engine.home());
        assert!(s.live_announcement(now + ANNOUNCEMENT_TTL).is_none());
    }

    #[test]
    fn resize_relays_out_without_moving() {
        let mut s = state();
        let before = s.engine.viewport();
        s.resize(150, 41, Instant::now());
        assert_eq!(s.engine.viewport(), before);
        assert_eq!(s.engine.view(), Vec2::new(1200.0, 640.0));
    }
}

//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer reads the engine and overlay state and turns it into cells on
//! the terminal.  No file I/O or decoding happens here.

pub mod effects_layer;
pub mod grid_widget;
pub mod layout;
pub mod loading;
pub mod status;
pub mod theme;

use std::time::Instant;

use ratatui::{widgets::Paragraph, Frame};

use crate::app::state::AppState;

use self::effects_layer::EffectsLayer;
use self::grid_widget::PetGridWidget;
use self::layout::{GridLayout, MIN_GRID_COLS, MIN_GRID_ROWS};
use self::loading::LoadingScreen;
use self::status::StatusBar;
use self::theme::Theme;

/// Render one frame.
pub fn draw(frame: &mut Frame, state: &AppState, now: Instant) {
    let layout = GridLayout::split(frame.area());

    if !state.loading.ready {
        frame.render_widget(
            LoadingScreen {
                progress: state.loading.progress,
                tick: state.frame,
                total: state.catalog.len(),
            },
            frame.area(),
        );
        return;
    }
    if layout.too_small() {
        let hint = format!("enlarge the terminal to at least {MIN_GRID_COLS}×{}", MIN_GRID_ROWS + 1);
        frame.render_widget(
            Paragraph::new(hint).centered().style(Theme::placeholder_style()),
            layout.grid,
        );
        frame.render_widget(StatusBar { state, now }, layout.status);
        return;
    }

    frame.render_widget(
        PetGridWidget {
            engine: &state.engine,
            catalog: &state.catalog,
            assets: &state.assets,
            thumbs: &state.thumbs,
            display: &state.config.display,
            overlay: &state.overlay,
            now,
            frame: state.frame,
        },
        layout.grid,
    );
    frame.render_widget(
        EffectsLayer {
            overlay: &state.overlay,
            display: &state.config.display,
            now,
        },
        layout.grid,
    );
    frame.render_widget(StatusBar { state, now }, layout.status);
}

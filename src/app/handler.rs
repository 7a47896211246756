//! Input handling: maps key/mouse events to engine calls.

use std::time::Instant;

use crossterm::event::{KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::config::Action;
use crate::core::vec2::Vec2;

use super::state::AppState;

/// Raw wheel delta for one notch, in world units.
const WHEEL_NOTCH: f64 = 100.0;

/// Process a key event.
pub fn handle_key(state: &mut AppState, key: KeyEvent, now: Instant) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    let Some(action) = state.config.match_key(key) else {
        return;
    };
    if action == Action::Quit {
        state.should_quit = true;
        return;
    }
    if !state.loading.ready {
        return;
    }

    let engine = &mut state.engine;
    match action {
        Action::PanLeft => engine.nudge(Vec2::new(1.0, 0.0)),
        Action::PanRight => engine.nudge(Vec2::new(-1.0, 0.0)),
        Action::PanUp => engine.nudge(Vec2::new(0.0, 1.0)),
        Action::PanDown => engine.nudge(Vec2::new(0.0, -1.0)),
        Action::Recenter => engine.recenter(),
        Action::FocusNext => {
            let described = engine
                .focus_next()
                .and_then(|id| state.catalog.get(id.item))
                .map(|item| item.description());
            if let Some(text) = described {
                state.announce(text, now);
            }
        }
        Action::Activate => engine.activate_focused(now),
        Action::CancelMode => {
            if !engine.cancel_placement() {
                tracing::debug!("nothing to cancel");
            }
        }
        Action::Quit => {}
    }
}

/// Process a mouse event.
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent, now: Instant) {
    if !state.loading.ready {
        return;
    }
    let inside = state.layout().on_grid(mouse.column, mouse.row);
    let pointer = state.world_from_cell(mouse.column, mouse.row);
    let horizontal = mouse.modifiers.contains(KeyModifiers::SHIFT);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if inside => state.engine.pointer_down(pointer, now),
        MouseEventKind::Drag(MouseButton::Left) => state.engine.pointer_move(pointer, now),
        MouseEventKind::Up(MouseButton::Left) => state.engine.pointer_up(pointer, now),
        MouseEventKind::Moved if inside => state.engine.pointer_hover(pointer, now),
        MouseEventKind::Moved => state.engine.pointer_leave(),
        MouseEventKind::ScrollDown if inside => state.engine.wheel(wheel_delta(WHEEL_NOTCH, horizontal)),
        MouseEventKind::ScrollUp if inside => state.engine.wheel(wheel_delta(-WHEEL_NOTCH, horizontal)),
        MouseEventKind::ScrollRight if inside => state.engine.wheel(Vec2::new(WHEEL_NOTCH, 0.0)),
        MouseEventKind::ScrollLeft if inside => state.engine.wheel(Vec2::new(-WHEEL_NOTCH, 0.0)),
        _ => {}
    }
}

/// Shift turns vertical wheel motion horizontal.
fn wheel_delta(amount: f64, horizontal: bool) -> Vec2 {
    if horizontal {
        Vec2::new(amount, 0.0)
    } else {
        Vec2::new(0.0, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::asset_runtime::AssetUpdate;
    use crate::config::AppConfig;
    use crate::core::behavior::{ItemCatalog, StampKind};
    use crossterm::event::KeyCode;
    use ratatui::layout::Rect;
    use std::path::Path;

    fn ready_state(now: Instant) -> AppState {
        let catalog = ItemCatalog::builtin(Path::new("pets"));
        let mut s = AppState::new(catalog, AppConfig::default(), Rect::new(0, 0, 100, 26), 3);
        s.apply_asset_update(AssetUpdate::Ready, now);
        s.tick(now);
        s
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn mouse_drag_moves_the_target() {
        let now = Instant::now();
        let mut s = ready_state(now);
        let start = s.engine.viewport().target;
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 50, 24), now);
        handle_mouse(&mut s, mouse(MouseEventKind::Drag(MouseButton::Left), 40, 24), now);
        assert!(s.engine.is_dragging());
        assert_eq!(s.engine.viewport().target, start + Vec2::new(-80.0, 0.0));
        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), 40, 24), now);
        assert!(!s.engine.is_dragging());
    }

    #[test]
    fn scroll_is_clamped_wheel_motion() {
        let now = Instant::now();
        let mut s = ready_state(now);
        let start = s.engine.viewport().target;
        handle_mouse(&mut s, mouse(MouseEventKind::ScrollDown, 10, 10), now);
        assert_eq!(s.engine.viewport().target, start - Vec2::new(0.0, 40.0));
    }

    #[test]
    fn keys_pan_focus_and_quit() {
        let now = Instant::now();
        let mut s = ready_state(now);
        let start = s.engine.viewport().target;
        handle_key(&mut s, key(KeyCode::Right), now);
        assert_eq!(s.engine.viewport().target, start - Vec2::new(120.0, 0.0));
        handle_key(&mut s, key(KeyCode::Char('r')), now);
        assert_eq!(s.engine.viewport().target, s.engine.home());

        handle_key(&mut s, key(KeyCode::Tab), now);
        assert!(s.engine.focus().is_some());
        assert!(s.live_announcement(now).is_some());

        handle_key(&mut s, key(KeyCode::Char('q')), now);
        assert!(s.should_quit);
    }

    #[test]
    fn escape_ends_placement() {
        let now = Instant::now();
        let mut s = ready_state(now);
        // 05.png: column 4 of the first row, 730..830 units across.
        handle_mouse(&mut s, mouse(MouseEventKind::Down(MouseButton::Left), 92, 7), now);
        handle_mouse(&mut s, mouse(MouseEventKind::Up(MouseButton::Left), 92, 7), now);
        assert_eq!(s.engine.placement(), Some(StampKind::MapleLeaf));
        handle_key(&mut s, key(KeyCode::Esc), now);
        assert_eq!(s.engine.placement(), None);
    }

    #[test]
    fn pointer_motion_tracks_hover() {
        let now = Instant::now();
        let mut s = ready_state(now);
        // 03.png: column 2 of the first row, 410..510 units across.
        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 55, 7), now);
        assert_eq!(s.engine.hovered().map(|id| id.item), Some(2));
        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 64, 7), now);
        assert_eq!(s.engine.hovered(), None);

        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 55, 7), now);
        // The status bar is outside the grid.
        handle_mouse(&mut s, mouse(MouseEventKind::Moved, 55, 25), now);
        assert_eq!(s.engine.hovered(), None);
    }
}

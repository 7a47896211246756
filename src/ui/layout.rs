//! Screen split and the mapping between terminal cells and world units.

use ratatui::layout::{Constraint, Layout, Position, Rect};

use crate::config::DisplaySettings;
use crate::core::vec2::Vec2;

/// Below this the grid is replaced by a resize hint.
pub const MIN_GRID_COLS: u16 = 24;
pub const MIN_GRID_ROWS: u16 = 6;

/// The pet canvas above a one-row status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub grid: Rect,
    pub status: Rect,
}

impl GridLayout {
    pub fn split(area: Rect) -> Self {
        let [grid, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        Self { grid, status }
    }

    pub fn too_small(&self) -> bool {
        self.grid.width < MIN_GRID_COLS || self.grid.height < MIN_GRID_ROWS
    }

    pub fn on_grid(&self, col: u16, row: u16) -> bool {
        self.grid.contains(Position::new(col, row))
    }

    /// Size of the canvas in world units.
    pub fn view_size(&self, display: &DisplaySettings) -> Vec2 {
        Vec2::new(
            self.grid.width as f64 * display.cell_width,
            self.grid.height as f64 * display.cell_height,
        )
    }

    /// World position of the centre of terminal cell `(col, row)`.
    pub fn world_from_cell(&self, col: u16, row: u16, display: &DisplaySettings) -> Vec2 {
        Vec2::new(
            (col as f64 - self.grid.x as f64 + 0.5) * display.cell_width,
            (row as f64 - self.grid.y as f64 + 0.5) * display.cell_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_takes_the_last_row() {
        let layout = GridLayout::split(Rect::new(0, 0, 100, 26));
        assert_eq!(layout.grid, Rect::new(0, 0, 100, 25));
        assert_eq!(layout.status, Rect::new(0, 25, 100, 1));
        assert!(layout.on_grid(99, 24));
        assert!(!layout.on_grid(10, 25));
        assert!(!layout.too_small());
    }

    #[test]
    fn cells_map_to_world_units() {
        let display = DisplaySettings::default();
        let layout = GridLayout::split(Rect::new(0, 0, 100, 26));
        assert_eq!(layout.view_size(&display), Vec2::new(800.0, 400.0));
        assert_eq!(layout.world_from_cell(0, 0, &display), Vec2::new(4.0, 8.0));
        assert_eq!(layout.world_from_cell(10, 2, &display), Vec2::new(84.0, 40.0));
    }

    #[test]
    fn tiny_terminals_are_flagged() {
        assert!(GridLayout::split(Rect::new(0, 0, 20, 30)).too_small());
        assert!(GridLayout::split(Rect::new(0, 0, 80, 4)).too_small());
        let empty = GridLayout::split(Rect::new(0, 0, 0, 0));
        assert!(empty.too_small());
        assert_eq!(empty.view_size(&DisplaySettings::default()), Vec2::ZERO);
    }
}

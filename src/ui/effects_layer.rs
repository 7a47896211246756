//! Stamps and burst particles drawn over the grid in view coordinates.

use std::time::Instant;

use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use crate::app::overlay::EffectsOverlay;
use crate::config::DisplaySettings;
use crate::core::vec2::Vec2;

use super::grid_widget::put_str;
use super::theme::Theme;

const PARTICLE_GLYPHS: &[&str] = &["●", "•", "∙"];

pub struct EffectsLayer<'a> {
    pub overlay: &'a EffectsOverlay,
    pub display: &'a DisplaySettings,
    pub now: Instant,
}

impl<'a> EffectsLayer<'a> {
    fn cell_of(&self, area: Rect, p: Vec2) -> (i32, i32) {
        (
            area.x as i32 + (p.x / self.display.cell_width).floor() as i32,
            area.y as i32 + (p.y / self.display.cell_height).floor() as i32,
        )
    }

    /// Cells covered by a square stamp `size` world units across.
    fn footprint(&self, size: f64) -> (i32, i32) {
        (
            (size / self.display.cell_width).round().max(1.0) as i32,
            (size / self.display.cell_height).round().max(1.0) as i32,
        )
    }
}

impl<'a> Widget for EffectsLayer<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for stamp in &self.overlay.stamps {
            let style = Theme::stamp_style(self.overlay.stamp_fading(stamp, self.now));
            let (cx, cy) = self.cell_of(area, stamp.at);
            let (cols, rows) = self.footprint(stamp.stamp.size());
            let (x0, y0) = (cx - cols / 2, cy - rows / 2);
            // Glyphs go on every other column; emoji are two cells wide.
            for y in y0..y0 + rows {
                for x in (x0..x0 + cols).step_by(2) {
                    put_str(buf, area, x, y, stamp.stamp.glyph(), style);
                }
            }
        }

        for burst in &self.overlay.bursts {
            for (i, p) in burst.positions(self.now).enumerate() {
                let (x, y) = self.cell_of(area, p);
                let glyph = PARTICLE_GLYPHS[i % PARTICLE_GLYPHS.len()];
                put_str(buf, area, x, y, glyph, Theme::particle_style());
            }
        }
    }
}

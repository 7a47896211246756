//! The pet grid: one framed tile per visible instance, each drawn at the
//! container translation plus its grid origin plus its follower offset.
//!
//! Terminals cannot rotate glyphs, so the follower rotation is drawn as a
//! horizontal shear of the tile's picture rows.

use std::collections::HashMap;
use std::time::Instant;

use image::imageops::FilterType;
use image::RgbaImage;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::Widget,
};

use crate::app::overlay::EffectsOverlay;
use crate::config::DisplaySettings;
use crate::core::assets::PetAsset;
use crate::core::behavior::{Capability, ItemCatalog};
use crate::core::effects::STOP_MOTION_FRAMES;
use crate::core::engine::GridEngine;
use crate::core::grid::InstanceId;

use super::theme::Theme;

/// Shear is capped so a wild spring never smears a tile across the screen.
const MAX_SHEAR_DEGREES: f64 = 30.0;
/// Alpha below this counts as transparent.
const ALPHA_VISIBLE: u8 = 128;
const SPIN_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];
/// Frames between flips of a flipping pet.
const FLIP_FRAMES: u64 = 90;
/// Lean of each stop-motion frame, added to the snapped tilt.
const STOP_MOTION_LEAN: [f64; STOP_MOTION_FRAMES] = [0.0, -12.0, 12.0, -6.0, 3.0];

// ─── thumbnail cache ────────────────────────────────────────────

/// Thumbnails resized for the current tile interior.  Rebuilt when the
/// interior size changes (terminal resize).
#[derive(Debug, Default)]
pub struct ThumbCache {
    size: (u16, u16),
    images: HashMap<usize, RgbaImage>,
}

impl ThumbCache {
    /// Make sure every loaded asset has a thumbnail fitted to
    /// `cols × rows` cells.
    pub fn prepare(&mut self, assets: &[Option<PetAsset>], cols: u16, rows: u16) {
        if self.size != (cols, rows) {
            self.images.clear();
            self.size = (cols, rows);
        }
        for (index, asset) in assets.iter().enumerate() {
            if self.images.contains_key(&index) {
                continue;
            }
            let Some(asset) = asset else {
                continue;
            };
            if let Some(thumb) = asset.thumb.as_deref() {
                if let Some(fitted) = fit_thumbnail(thumb, asset.aspect_ratio, cols, rows) {
                    self.images.insert(index, fitted);
                }
            }
        }
    }

    pub fn get(&self, item: usize) -> Option<&RgbaImage> {
        self.images.get(&item)
    }
}

/// Fit an image of the given aspect ratio (width over height) into
/// `cols × rows` half-block cells (1 px wide, 2 px tall per cell), never
/// upscaling past the thumbnail's own pixels.
fn fit_thumbnail(thumb: &RgbaImage, aspect_ratio: f64, cols: u16, rows: u16) -> Option<RgbaImage> {
    if cols == 0 || rows == 0 || thumb.width() == 0 || thumb.height() == 0 {
        return None;
    }
    let max_px_w = cols as f64;
    let max_px_h = rows as f64 * 2.0;
    let src_w = thumb.width() as f64;
    let src_h = thumb.height() as f64;
    let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        src_w / src_h
    };

    let (box_w, box_h) = if aspect >= max_px_w / max_px_h {
        (max_px_w, max_px_w / aspect)
    } else {
        (max_px_h * aspect, max_px_h)
    };
    let shrink = (src_w / box_w).min(src_h / box_h).min(1.0);
    let fit_w = (box_w * shrink).round().max(1.0) as u32;
    let fit_h = (box_h * shrink).round().max(1.0) as u32;
    Some(image::imageops::resize(thumb, fit_w, fit_h, FilterType::Triangle))
}

/// Interior size (cells) of one tile for the engine's current grid.
pub fn tile_interior(engine: &GridEngine, display: &DisplaySettings) -> (u16, u16) {
    let (w, h) = tile_size(engine, display);
    ((w - 2).max(0) as u16, (h - 2).max(0) as u16)
}

fn tile_size(engine: &GridEngine, display: &DisplaySettings) -> (i32, i32) {
    let cell = engine.grid().cell;
    (
        (cell.x / display.cell_width).round().max(3.0) as i32,
        (cell.y / display.cell_height).round().max(3.0) as i32,
    )
}

// ─── widget ─────────────────────────────────────────────────────

pub struct PetGridWidget<'a> {
    pub engine: &'a GridEngine,
    pub catalog: &'a ItemCatalog,
    pub assets: &'a [Option<PetAsset>],
    pub thumbs: &'a ThumbCache,
    pub display: &'a DisplaySettings,
    pub overlay: &'a EffectsOverlay,
    pub now: Instant,
    pub frame: u64,
}

/// Tile rectangle in signed cell coordinates; may hang off the area.
#[derive(Debug, Clone, Copy)]
struct TileRect {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl<'a> Widget for PetGridWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (w, h) = tile_size(self.engine, self.display);
        for id in self.engine.visible() {
            self.render_tile(*id, w, h, area, buf);
        }
    }
}

impl<'a> PetGridWidget<'a> {
    fn render_tile(&self, id: InstanceId, w: i32, h: i32, area: Rect, buf: &mut Buffer) {
        let Some(item) = self.catalog.get(id.item) else {
            return;
        };
        let entrance = self.engine.entrance_progress(id.item, self.now);
        if entrance <= 0.0 {
            return;
        }

        let pos = self.engine.instance_position(id);
        let mut rect = TileRect {
            x: area.x as i32 + (pos.x / self.display.cell_width).round() as i32,
            y: area.y as i32 + (pos.y / self.display.cell_height).round() as i32,
            w,
            h,
        };
        if self.overlay.is_wiggling(id.item) {
            rect.x += if self.frame % 2 == 0 { 1 } else { -1 };
        }

        let behavior = &item.behavior;
        let asset = self.assets.get(id.item).and_then(Option::as_ref);
        let tint = asset.map_or([196, 190, 210], |a| a.mean_color);

        let mut border = Theme::tile_border(tint);
        if let Some(offset) = self.engine.holo_offset(id.item) {
            let ramp = &Theme::HOLO_RAMP;
            let step = ((offset.x + offset.y) / 40.0).floor() as i64;
            border = Style::default().fg(ramp[step.rem_euclid(ramp.len() as i64) as usize]);
        }
        if behavior.has(Capability::Framed) {
            border = Theme::frame_style();
        }
        if self.engine.focus() == Some(id) {
            border = Theme::focus_style();
        }
        draw_frame(buf, area, rect, border, behavior.has(Capability::Framed));

        let mut tilt = self.engine.item_transform(&id).rotation_degrees;
        let mut caption = format!(" {} ", item.label());
        if behavior.has(Capability::MomentumMood) {
            let (mood, mood_tilt) = self.engine.mood();
            tilt += mood_tilt;
            caption = format!(" {} {} ", item.label(), mood.label());
        }
        if let Some(lean) = self.engine.card_tilt(id.item) {
            // Only the turn about the vertical axis reads as shear.
            tilt += lean.x;
        }
        if behavior.has(Capability::StopMotion) {
            tilt = stop_motion_tilt(tilt, self.engine.stop_motion_frame(id.item, self.now));
        }
        let mirrored = behavior.has(Capability::Flip) && (self.frame / FLIP_FRAMES) % 2 == 1;
        if self.overlay.has_sound_cue(id.item) {
            caption.push_str("♪ ");
        }
        put_str(buf, area, rect.x + 2, rect.y + rect.h - 1, &caption, Theme::label_style());
        if behavior.has(Capability::Spin) {
            let glyph = SPIN_FRAMES[(self.frame / 4) as usize % SPIN_FRAMES.len()];
            put_str(buf, area, rect.x + rect.w - 3, rect.y, glyph, Theme::cue_style());
        }

        let inner = TileRect {
            x: rect.x + 1,
            y: rect.y + 1,
            w: rect.w - 2,
            h: rect.h - 2,
        };
        match self.thumbs.get(id.item) {
            Some(img) if entrance >= 0.5 => draw_halfblocks(buf, area, inner, img, tilt, mirrored),
            _ => {
                let mark = if asset.is_some_and(PetAsset::is_placeholder) { "?" } else { "·" };
                put_str(
                    buf,
                    area,
                    inner.x + inner.w / 2,
                    inner.y + inner.h / 2,
                    mark,
                    Theme::placeholder_style(),
                );
            }
        }
    }
}

// ─── drawing helpers ────────────────────────────────────────────

/// Stop-motion pets move in 10° steps plus the lean of the current frame.
fn stop_motion_tilt(tilt: f64, frame: usize) -> f64 {
    (tilt / 10.0).round() * 10.0 + STOP_MOTION_LEAN[frame.min(STOP_MOTION_FRAMES - 1)]
}

fn cell_in<'b>(buf: &'b mut Buffer, area: Rect, x: i32, y: i32) -> Option<&'b mut ratatui::buffer::Cell> {
    let inside = x >= area.x as i32
        && y >= area.y as i32
        && x < area.right() as i32
        && y < area.bottom() as i32;
    if !inside {
        return None;
    }
    buf.cell_mut(Position::new(x as u16, y as u16))
}

fn put(buf: &mut Buffer, area: Rect, x: i32, y: i32, symbol: &str, style: Style) {
    if let Some(cell) = cell_in(buf, area, x, y) {
        cell.set_symbol(symbol).set_style(style);
    }
}

/// Write a string one grapheme per column, clipped to `area`.
pub(super) fn put_str(buf: &mut Buffer, area: Rect, x: i32, y: i32, text: &str, style: Style) {
    if y < area.y as i32 || y >= area.bottom() as i32 {
        return;
    }
    let start = x.max(area.x as i32);
    let skip = (start - x) as usize;
    if start >= area.right() as i32 {
        return;
    }
    let max_width = (area.right() as i32 - start) as usize;
    let visible: String = text.chars().skip(skip).collect();
    buf.set_stringn(start as u16, y as u16, visible, max_width, style);
}

fn draw_frame(buf: &mut Buffer, area: Rect, r: TileRect, style: Style, double: bool) {
    let (h, v, tl, tr, bl, br) = if double {
        ("═", "║", "╔", "╗", "╚", "╝")
    } else {
        ("─", "│", "╭", "╮", "╰", "╯")
    };
    let (right, bottom) = (r.x + r.w - 1, r.y + r.h - 1);
    for x in r.x + 1..right {
        put(buf, area, x, r.y, h, style);
        put(buf, area, x, bottom, h, style);
    }
    for y in r.y + 1..bottom {
        put(buf, area, r.x, y, v, style);
        put(buf, area, right, y, v, style);
    }
    put(buf, area, r.x, r.y, tl, style);
    put(buf, area, right, r.y, tr, style);
    put(buf, area, r.x, bottom, bl, style);
    put(buf, area, right, bottom, br, style);
}

/// Half-block picture (2 px per cell) centred in `inner`, each row shifted
/// sideways to suggest a rotation of `tilt` degrees.
fn draw_halfblocks(
    buf: &mut Buffer,
    area: Rect,
    inner: TileRect,
    img: &RgbaImage,
    tilt: f64,
    mirrored: bool,
) {
    if inner.w <= 0 || inner.h <= 0 {
        return;
    }
    let (iw, ih) = (img.width() as i32, img.height() as i32);
    let rows = (ih + 1) / 2;
    let col_offset = (inner.w - iw).max(0) / 2;
    let row_offset = (inner.h - rows).max(0) / 2;
    let shear = tilt.clamp(-MAX_SHEAR_DEGREES, MAX_SHEAR_DEGREES).to_radians().tan() * 2.0;
    let mid = rows as f64 / 2.0;

    for row in 0..rows.min(inner.h) {
        let dx = (-shear * (row as f64 - mid)).round() as i32;
        let y = inner.y + row_offset + row;
        for col in 0..iw.min(inner.w) {
            let src_col = (if mirrored { iw - 1 - col } else { col }) as u32;
            let top = img.get_pixel(src_col, (row * 2) as u32);
            let bottom = (row * 2 + 1 < ih).then(|| img.get_pixel(src_col, (row * 2 + 1) as u32));
            let top_on = top[3] >= ALPHA_VISIBLE;
            let bottom_on = bottom.is_some_and(|b| b[3] >= ALPHA_VISIBLE);
            let x = inner.x + col_offset + col + dx;
            let (symbol, style) = match (top_on, bottom) {
                (true, Some(b)) if bottom_on => (
                    "▀",
                    Style::default().fg(rgb(top)).bg(rgb(b)),
                ),
                (true, _) => ("▀", Style::default().fg(rgb(top))),
                (false, Some(b)) if bottom_on => ("▄", Style::default().fg(rgb(b))),
                _ => continue,
            };
            put(buf, area, x, y, symbol, style);
        }
    }
}

fn rgb(px: &image::Rgba<u8>) -> Color {
    Color::Rgb(px[0], px[1], px[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn thumbnails_fit_without_upscaling() {
        let big = RgbaImage::from_pixel(96, 48, Rgba([0, 0, 0, 255]));
        let fitted = fit_thumbnail(&big, 2.0, 10, 4).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (10, 5));

        let small = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let kept = fit_thumbnail(&small, 1.0, 10, 10).unwrap();
        assert_eq!((kept.width(), kept.height()), (4, 4));
        assert!(fit_thumbnail(&small, 1.0, 0, 3).is_none());
    }

    #[test]
    fn thumbnails_follow_the_source_aspect_ratio() {
        // A 96 px square thumbnail of a 3:1 source still fits as 3:1.
        let thumb = RgbaImage::from_pixel(96, 96, Rgba([0, 0, 0, 255]));
        let fitted = fit_thumbnail(&thumb, 3.0, 12, 6).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (12, 4));

        let tall = fit_thumbnail(&thumb, 0.5, 12, 6).unwrap();
        assert_eq!((tall.width(), tall.height()), (6, 12));
    }

    #[test]
    fn stop_motion_snaps_then_leans_per_frame() {
        assert_eq!(stop_motion_tilt(4.0, 0), 0.0);
        assert_eq!(stop_motion_tilt(16.0, 1), 8.0);
        assert_eq!(stop_motion_tilt(0.0, 2), 12.0);
        assert_eq!(stop_motion_tilt(0.0, 99), 3.0);
    }

    #[test]
    fn frames_clip_at_the_area_edge() {
        let area = Rect::new(0, 0, 6, 4);
        let mut buf = Buffer::empty(area);
        let tile = TileRect { x: -2, y: 1, w: 5, h: 4 };
        draw_frame(&mut buf, area, tile, Style::default(), false);
        assert_eq!(buf[(2, 1)].symbol(), "╮");
        assert_eq!(buf[(0, 1)].symbol(), "─");
        assert_eq!(buf[(2, 3)].symbol(), "│");
        assert_eq!(buf[(5, 1)].symbol(), " ");
    }

    #[test]
    fn transparent_pixels_leave_cells_untouched() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        let inner = TileRect { x: 0, y: 0, w: 2, h: 1 };
        draw_halfblocks(&mut buf, area, inner, &img, 0.0, false);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(1, 0)].symbol(), " ");

        let mut flipped = Buffer::empty(area);
        draw_halfblocks(&mut flipped, area, inner, &img, 0.0, true);
        assert_eq!(flipped[(0, 0)].symbol(), " ");
        assert_eq!(flipped[(1, 0)].symbol(), "▀");
    }
}

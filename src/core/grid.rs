//! Logical tile grid and the `K×K` block of rendered copies around it.

use serde::{Deserialize, Serialize};

use super::vec2::{Vec2, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    /// Columns in the logical grid.
    pub cols: usize,
    /// Gap between cells as a fraction of the cell size.
    pub gap_ratio: f64,
    /// Cells are `viewport_height / cells_per_height` tall.
    pub cells_per_height: f64,
    /// Edge length `K` of the duplicated tile block (odd).
    pub tiles: usize,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            cols: 6,
            gap_ratio: 0.6,
            cells_per_height: 4.0,
            tiles: 7,
        }
    }
}

/// One rendered copy of one logical item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    pub tile_x: i32,
    pub tile_y: i32,
    pub item: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileGrid {
    pub cols: usize,
    pub rows: usize,
    pub item_count: usize,
    pub cell: Vec2,
    pub gap: f64,
    /// Half-width of the duplicated block: offsets run `-half..=half`.
    pub half_tiles: i32,
}

impl TileGrid {
    /// Lay out `item_count` items for a viewport `viewport_height` units tall.
    pub fn layout(item_count: usize, viewport_height: f64, tuning: &LayoutTuning) -> Self {
        let cols = tuning.cols.max(1);
        let rows = item_count.div_ceil(cols).max(1);
        let side = if viewport_height.is_finite() && viewport_height > EPSILON {
            viewport_height / tuning.cells_per_height.max(1.0)
        } else {
            1.0
        };
        Self {
            cols,
            rows,
            item_count,
            cell: Vec2::new(side, side),
            gap: side * tuning.gap_ratio.max(0.0),
            half_tiles: (tuning.tiles.max(1) as i32 - 1) / 2,
        }
    }

    /// Fixed-size grid, mostly for tests.
    #[cfg(test)]
    pub fn fixed(cols: usize, rows: usize, cell: Vec2, gap: f64, tiles: usize) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            item_count: cols.max(1) * rows.max(1),
            cell,
            gap,
            half_tiles: (tiles.max(1) as i32 - 1) / 2,
        }
    }

    pub fn grid_width(&self) -> f64 {
        self.cols as f64 * (self.cell.x + self.gap)
    }

    pub fn grid_height(&self) -> f64 {
        self.rows as f64 * (self.cell.y + self.gap)
    }

    pub fn grid_size(&self) -> Vec2 {
        Vec2::new(self.grid_width(), self.grid_height())
    }

    /// Top-left of `item` inside the origin tile.
    pub fn item_origin(&self, item: usize) -> Vec2 {
        let col = item % self.cols;
        let row = item / self.cols;
        Vec2::new(
            col as f64 * (self.cell.x + self.gap),
            row as f64 * (self.cell.y + self.gap),
        )
    }

    /// Top-left of an instance in container coordinates.
    pub fn instance_origin(&self, id: InstanceId) -> Vec2 {
        self.item_origin(id.item)
            + Vec2::new(
                id.tile_x as f64 * self.grid_width(),
                id.tile_y as f64 * self.grid_height(),
            )
    }

    /// Instances whose cell intersects the view rectangle `[0, view)` once
    /// the container is translated by `translation`.
    pub fn visible_instances(&self, translation: Vec2, view: Vec2) -> Vec<InstanceId> {
        let mut out = Vec::new();
        for tile_y in -self.half_tiles..=self.half_tiles {
            for tile_x in -self.half_tiles..=self.half_tiles {
                for item in 0..self.item_count {
                    let id = InstanceId { tile_x, tile_y, item };
                    let p = self.instance_origin(id) + translation;
                    if p.x < view.x && p.x + self.cell.x > 0.0 && p.y < view.y && p.y + self.cell.y > 0.0 {
                        out.push(id);
                    }
                }
            }
        }
        out
    }

    /// Whether the rendered block spans the whole view at `translation`.
    #[cfg(test)]
    pub fn covers_view(&self, translation: Vec2, view: Vec2) -> bool {
        let half = self.half_tiles as f64;
        let size = self.grid_size();
        let left = translation.x - half * size.x;
        let top = translation.y - half * size.y;
        let right = translation.x + (half + 1.0) * size.x;
        let bottom = translation.y + (half + 1.0) * size.y;
        left <= 0.0 && top <= 0.0 && right >= view.x && bottom >= view.y
    }

    /// Item whose cell contains `point` (container coordinates), if any.
    pub fn hit_test(&self, point: Vec2) -> Option<InstanceId> {
        let size = self.grid_size();
        if size.x <= EPSILON || size.y <= EPSILON || !point.is_finite() {
            return None;
        }
        let tile_x = (point.x / size.x).floor();
        let tile_y = (point.y / size.y).floor();
        let local = point - Vec2::new(tile_x * size.x, tile_y * size.y);
        let pitch = self.cell + Vec2::new(self.gap, self.gap);
        let col = (local.x / pitch.x).floor() as usize;
        let row = (local.y / pitch.y).floor() as usize;
        let in_cell = local.x - col as f64 * pitch.x < self.cell.x
            && local.y - row as f64 * pitch.y < self.cell.y;
        let item = row * self.cols + col;
        let (tile_x, tile_y) = (tile_x as i32, tile_y as i32);
        if !in_cell
            || col >= self.cols
            || item >= self.item_count
            || tile_x.abs() > self.half_tiles
            || tile_y.abs() > self.half_tiles
        {
            return None;
        }
        Some(InstanceId { tile_x, tile_y, item })
    }
}

// src/map/blockmap.rs

use crate::dmu::handle::LineId;
use crate::map::Map;
use crate::utils::Aabb;

/// Edge length of one blockmap cell, in map units.
pub const BLOCK_SIZE: f64 = 128.0;

/// A coarse spatial grid over the map's lines: each cell lists every line
/// whose bounding box touches it. Used by the box-query protocol to avoid
/// scanning the whole line table.
#[derive(Debug, Clone)]
pub struct Blockmap {
    origin: [f64; 2],
    width: usize,
    height: usize,
    cells: Vec<Vec<LineId>>,
    num_lines: usize,
}

impl Blockmap {
    pub fn build(map: &Map) -> Blockmap {
        let mut bounds = Aabb::new_empty();
        for line in map.lines() {
            bounds.combine(&line.bounds);
        }
        if bounds.is_empty() {
            bounds = Aabb::new([0.0, 0.0], [0.0, 0.0]);
        }

        let width = (((bounds.max[0] - bounds.min[0]) / BLOCK_SIZE).floor() as usize) + 1;
        let height = (((bounds.max[1] - bounds.min[1]) / BLOCK_SIZE).floor() as usize) + 1;
        let mut blockmap = Blockmap {
            origin: bounds.min,
            width,
            height,
            cells: vec![Vec::new(); width * height],
            num_lines: map.line_count(),
        };

        for (index, line) in map.lines().iter().enumerate() {
            let id = LineId(index as u32);
            let (x0, x1, y0, y1) = blockmap.cell_range(&line.bounds);
            for cy in y0..=y1 {
                for cx in x0..=x1 {
                    blockmap.cells[cy * width + cx].push(id);
                }
            }
        }
        blockmap
    }

    fn cell_range(&self, bounds: &Aabb) -> (usize, usize, usize, usize) {
        let clamp_x = |v: f64| {
            (((v - self.origin[0]) / BLOCK_SIZE).floor().max(0.0) as usize).min(self.width - 1)
        };
        let clamp_y = |v: f64| {
            (((v - self.origin[1]) / BLOCK_SIZE).floor().max(0.0) as usize).min(self.height - 1)
        };
        (
            clamp_x(bounds.min[0]),
            clamp_x(bounds.max[0]),
            clamp_y(bounds.min[1]),
            clamp_y(bounds.max[1]),
        )
    }

    /// Calls `callback` once for every line whose cells intersect the box,
    /// in storage order per cell with duplicates suppressed. A `true`
    /// return stops the walk early; the stop is reported to the caller.
    pub fn lines_in_box(&self, bounds: &Aabb, mut callback: impl FnMut(LineId) -> bool) -> bool {
        let mut visited = vec![false; self.num_lines];
        let (x0, x1, y0, y1) = self.cell_range(bounds);
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                for &id in &self.cells[cy * self.width + cx] {
                    if visited[id.index()] {
                        continue;
                    }
                    visited[id.index()] = true;
                    if callback(id) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

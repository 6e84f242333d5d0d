// src/bsp/sight.rs
//
// Line-of-sight tracing over the BSP tree. The trace walks front-to-back
// so the first blocking intersection found is the nearest one, and keeps
// a per-trace visited set over lines (a line bounding several leafs is
// tested once per trace). The visited set is local to the trace, so
// concurrent traces against the same map are safe.

use log::debug;

use crate::bsp::{BspChild, BspTree};
use crate::dmu::handle::{LeafId, LineId};
use crate::errors::DmuError;
use crate::map::Map;

/// Ceiling-height differences do not narrow the sight window.
pub const PASS_OVER: u32 = 0x1;
/// Floor-height differences do not narrow the sight window.
pub const PASS_UNDER: u32 = 0x2;

/// Hard ceiling on trace work; a healthy tree never gets close. Running
/// into it means the tree is corrupt and is reported as a hard error,
/// never as "no sight".
const MAX_TRACE_STEPS: u32 = 1 << 16;

/// A 2D ray for side classification, point plus direction.
#[derive(Debug, Clone, Copy)]
struct Divline {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
}

/// 0 front, 1 back, 2 exactly on the line. Same orientation convention
/// as `Partition::point_on_side`.
fn divline_side(p: [f64; 2], dl: &Divline) -> usize {
    if dl.dx == 0.0 {
        return if p[0] == dl.x {
            2
        } else if p[0] < dl.x {
            (dl.dy > 0.0) as usize
        } else {
            (dl.dy < 0.0) as usize
        };
    }
    let cross = dl.dx * (p[1] - dl.y) - dl.dy * (p[0] - dl.x);
    if cross < 0.0 {
        0
    } else if cross > 0.0 {
        1
    } else {
        2
    }
}

/// Fraction along `trace` at which it crosses the line through `dl`.
fn intercept_fraction(trace: &Divline, dl: &Divline) -> f64 {
    let den = dl.dy * trace.dx - dl.dx * trace.dy;
    let num = (dl.x - trace.x) * dl.dy + (trace.y - dl.y) * dl.dx;
    num / den
}

/// State for one line-of-sight query.
pub struct SightLine<'a> {
    map: &'a Map,
    tree: &'a BspTree,
    trace: Divline,
    from: [f64; 3],
    to: [f64; 3],
    /// Sight window as z-per-unit-trace slopes, narrowed as two-sided
    /// lines are crossed.
    bottom_slope: f64,
    top_slope: f64,
    flags: u32,
    visited: Vec<bool>,
    steps: u32,
}

impl<'a> SightLine<'a> {
    fn new(
        map: &'a Map,
        tree: &'a BspTree,
        from: [f64; 3],
        to: [f64; 3],
        bottom_slope: f64,
        top_slope: f64,
        flags: u32,
    ) -> Self {
        SightLine {
            map,
            tree,
            trace: Divline {
                x: from[0],
                y: from[1],
                dx: to[0] - from[0],
                dy: to[1] - from[1],
            },
            from,
            to,
            bottom_slope,
            top_slope,
            flags,
            visited: vec![false; map.line_count()],
            steps: 0,
        }
    }

    fn step(&mut self) -> Result<(), DmuError> {
        self.steps += 1;
        if self.steps > MAX_TRACE_STEPS {
            Err(DmuError::TraceBudgetExceeded { steps: self.steps })
        } else {
            Ok(())
        }
    }

    /// Tests one potentially crossing line. `Ok(true)` means the trace
    /// continues past it.
    fn cross_line(&mut self, id: LineId) -> Result<bool, DmuError> {
        let line = self.map.line(id)?;
        let v1 = self.map.vertex(line.v[0])?.origin;
        let v2 = self.map.vertex(line.v[1])?.origin;

        // Reject lines the trace segment does not actually cross.
        if divline_side(v1, &self.trace) == divline_side(v2, &self.trace) {
            return Ok(true);
        }
        let dl = Divline {
            x: v1[0],
            y: v1[1],
            dx: v2[0] - v1[0],
            dy: v2[1] - v1[1],
        };
        if divline_side([self.from[0], self.from[1]], &dl)
            == divline_side([self.to[0], self.to[1]], &dl)
        {
            return Ok(true);
        }

        // A one-sided wall blocks outright.
        let Some(back_id) = line.back else {
            return Ok(false);
        };
        let Some(front_id) = line.front else {
            debug!("sight trace: line {:?} has a back side but no front, skipping", id);
            return Ok(true);
        };

        let front_sector = self.map.side(front_id)?.sector;
        let back_sector = self.map.side(back_id)?.sector;
        let (Some(front_sector), Some(back_sector)) = (front_sector, back_sector) else {
            debug!("sight trace: line {:?} side without sector, skipping", id);
            return Ok(true);
        };
        if front_sector == back_sector {
            // Self-referencing trick geometry never blocks.
            debug!("sight trace: self-referencing line {:?}, skipping", id);
            return Ok(true);
        }

        let front = self.map.sector(front_sector)?;
        let back = self.map.sector(back_sector)?;
        let (ffloor, fceil) = (front.floor_height(), front.ceiling_height());
        let (bfloor, bceil) = (back.floor_height(), back.ceiling_height());

        // No height change across the line, nothing to occlude.
        if ffloor == bfloor && fceil == bceil {
            return Ok(true);
        }

        let open_top = fceil.min(bceil);
        let open_bottom = ffloor.max(bfloor);
        if open_bottom >= open_top {
            return Ok(false);
        }

        let frac = intercept_fraction(&self.trace, &dl);
        if !frac.is_finite() || frac <= 0.0 {
            debug!("sight trace: degenerate crossing on line {:?}, skipping", id);
            return Ok(true);
        }

        if ffloor != bfloor && self.flags & PASS_UNDER == 0 {
            let slope = (open_bottom - self.from[2]) / frac;
            if slope > self.bottom_slope {
                self.bottom_slope = slope;
            }
        }
        if fceil != bceil && self.flags & PASS_OVER == 0 {
            let slope = (open_top - self.from[2]) / frac;
            if slope < self.top_slope {
                self.top_slope = slope;
            }
        }

        Ok(self.top_slope > self.bottom_slope)
    }

    fn cross_leaf(&mut self, id: LeafId) -> Result<bool, DmuError> {
        // Leaf hedges are cloned up front so the line tests can borrow
        // the map; leafs are small rings, this is cheap.
        let hedges = self.tree.leaf(id)?.hedges.clone();
        for hedge in &hedges {
            self.step()?;
            let Some(line_id) = hedge.line else {
                continue;
            };
            if line_id.index() >= self.visited.len() || self.visited[line_id.index()] {
                continue;
            }
            self.visited[line_id.index()] = true;
            if self.map.is_zero_length(line_id) {
                debug!("sight trace: zero-length line {:?}, skipping", line_id);
                continue;
            }
            if !self.cross_line(line_id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn cross_child(&mut self, child: BspChild) -> Result<bool, DmuError> {
        self.step()?;
        match child {
            BspChild::Leaf(id) => self.cross_leaf(id),
            BspChild::Node(id) => {
                let node = self.tree.node(id)?;
                let partition = Divline {
                    x: node.partition.origin[0],
                    y: node.partition.origin[1],
                    dx: node.partition.direction[0],
                    dy: node.partition.direction[1],
                };
                let children = node.children;

                let mut near = divline_side([self.from[0], self.from[1]], &partition);
                if near == 2 {
                    near = 0;
                }
                if !self.cross_child(children[near])? {
                    return Ok(false);
                }
                // The far side only matters if the trace reaches it.
                if divline_side([self.to[0], self.to[1]], &partition) == near {
                    return Ok(true);
                }
                self.cross_child(children[near ^ 1])
            }
        }
    }
}

/// Determines whether an uninterrupted sight line runs from `from` to
/// `to`, with the vertical window given as z-per-unit-trace slopes
/// relative to `from`'s z.
pub fn check_sight(
    map: &Map,
    from: [f64; 3],
    to: [f64; 3],
    bottom_slope: f64,
    top_slope: f64,
    flags: u32,
) -> Result<bool, DmuError> {
    let tree = map.bsp().ok_or(DmuError::NoBspTree)?;
    let mut sight = SightLine::new(map, tree, from, to, bottom_slope, top_slope, flags);
    sight.cross_child(tree.root())
}

// src/utils/geometry.rs
// Geometry helpers shared by the map container, blockmap and BSP code.

/// An axis-aligned bounding box in map space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb {
    pub fn new_empty() -> Self {
        Aabb {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb { min, max }
    }

    pub fn from_points(a: [f64; 2], b: [f64; 2]) -> Self {
        Aabb {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn expand_point(&mut self, x: f64, y: f64) {
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn combine(&mut self, other: &Aabb) {
        self.min[0] = self.min[0].min(other.min[0]);
        self.min[1] = self.min[1].min(other.min[1]);
        self.max[0] = self.max[0].max(other.max[0]);
        self.max[1] = self.max[1].max(other.max[1]);
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.max[0] >= other.min[0]
            && self.min[0] <= other.max[0]
            && self.max[1] >= other.min[1]
            && self.min[1] <= other.max[1]
    }
}

/// Perpendicular ("cross") distance sign of point `p` relative to the ray
/// from `origin` along `direction`. Positive on one side, negative on the
/// other, zero exactly on the line.
#[inline]
pub fn perp_distance(origin: [f64; 2], direction: [f64; 2], p: [f64; 2]) -> f64 {
    direction[0] * (p[1] - origin[1]) - direction[1] * (p[0] - origin[0])
}

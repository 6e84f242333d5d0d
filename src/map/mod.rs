// src/map/mod.rs

pub mod blockmap;
pub mod line;
pub mod material;
pub mod sector;
pub mod surface;
pub mod vertex;

pub use blockmap::{Blockmap, BLOCK_SIZE};
pub use line::{line_flags, Line, LineSide, SlopeType};
pub use material::{Material, MaterialBank};
pub use sector::{Plane, PlaneKind, Sector};
pub use surface::Surface;
pub use vertex::Vertex;

use rayon::prelude::*;

use crate::bsp::BspTree;
use crate::dmu::handle::{
    ElementType, LineId, PlaneId, SectorId, SideId, VertexId,
};
use crate::errors::DmuError;
use crate::utils::Aabb;

/// The map: owner of every element and of the spatial index built over
/// them. Elements are created during conversion or an explicit editing
/// phase and live until the map is cleared or dropped.
#[derive(Debug, Default)]
pub struct Map {
    vertices: Vec<Vertex>,
    lines: Vec<Line>,
    sides: Vec<LineSide>,
    sectors: Vec<Sector>,
    bsp: Option<BspTree>,
    blockmap: Option<Blockmap>,
}

impl Map {
    pub fn new() -> Self {
        Map::default()
    }

    // --- Counts and raw views ---

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn sides(&self) -> &[LineSide] {
        &self.sides
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn bsp(&self) -> Option<&BspTree> {
        self.bsp.as_ref()
    }

    pub fn blockmap(&self) -> Option<&Blockmap> {
        self.blockmap.as_ref()
    }

    // --- Typed lookups ---

    fn range_err(ty: ElementType, index: usize, count: usize) -> DmuError {
        DmuError::IndexOutOfRange { ty, index, count }
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex, DmuError> {
        self.vertices
            .get(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Vertex, id.index(), self.vertices.len()))
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut Vertex, DmuError> {
        let count = self.vertices.len();
        self.vertices
            .get_mut(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Vertex, id.index(), count))
    }

    pub fn line(&self, id: LineId) -> Result<&Line, DmuError> {
        self.lines
            .get(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Line, id.index(), self.lines.len()))
    }

    pub fn line_mut(&mut self, id: LineId) -> Result<&mut Line, DmuError> {
        let count = self.lines.len();
        self.lines
            .get_mut(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Line, id.index(), count))
    }

    pub fn side(&self, id: SideId) -> Result<&LineSide, DmuError> {
        self.sides
            .get(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Side, id.index(), self.sides.len()))
    }

    pub fn side_mut(&mut self, id: SideId) -> Result<&mut LineSide, DmuError> {
        let count = self.sides.len();
        self.sides
            .get_mut(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Side, id.index(), count))
    }

    pub fn sector(&self, id: SectorId) -> Result<&Sector, DmuError> {
        self.sectors
            .get(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Sector, id.index(), self.sectors.len()))
    }

    pub fn sector_mut(&mut self, id: SectorId) -> Result<&mut Sector, DmuError> {
        let count = self.sectors.len();
        self.sectors
            .get_mut(id.index())
            .ok_or_else(|| Self::range_err(ElementType::Sector, id.index(), count))
    }

    pub fn plane(&self, id: PlaneId) -> Result<&Plane, DmuError> {
        self.sector(id.sector)?.plane(id.plane)
    }

    pub fn plane_mut(&mut self, id: PlaneId) -> Result<&mut Plane, DmuError> {
        self.sector_mut(id.sector)?.plane_mut(id.plane)
    }

    // --- Editing-phase construction ---

    pub fn add_vertex(&mut self, x: f64, y: f64) -> VertexId {
        self.vertices.push(Vertex::new(x, y));
        VertexId((self.vertices.len() - 1) as u32)
    }

    pub fn add_line(&mut self, v0: VertexId, v1: VertexId) -> LineId {
        self.lines.push(Line::new(v0, v1));
        LineId((self.lines.len() - 1) as u32)
    }

    /// Adds a side and attaches it as the line's front (`which` 0) or
    /// back (`which` 1).
    pub fn add_side(
        &mut self,
        line: LineId,
        which: usize,
        sector: Option<SectorId>,
    ) -> Result<SideId, DmuError> {
        self.line(line)?;
        self.sides.push(LineSide::new(line, sector));
        let id = SideId((self.sides.len() - 1) as u32);
        let line = self.line_mut(line)?;
        if which == 0 {
            line.front = Some(id);
        } else {
            line.back = Some(id);
            line.flags |= line_flags::TWO_SIDED;
        }
        Ok(id)
    }

    pub fn add_sector(&mut self, floor: f64, ceiling: f64, light: f32) -> SectorId {
        self.sectors.push(Sector::new(floor, ceiling, light));
        SectorId((self.sectors.len() - 1) as u32)
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.lines.clear();
        self.sides.clear();
        self.sectors.clear();
        self.bsp = None;
        self.blockmap = None;
    }

    // --- Derived-state maintenance ---

    /// Recomputes a line's geometry caches and its sides' wall tangent
    /// frames from the current vertex positions.
    pub fn refresh_line(&mut self, id: LineId) -> Result<(), DmuError> {
        let line = self.line(id)?;
        let v0 = self.vertex(line.v[0])?.origin;
        let v1 = self.vertex(line.v[1])?.origin;
        let (front, back) = (line.front, line.back);

        let line = self.line_mut(id)?;
        line.update_geometry(v0, v1);
        let dir = line.direction;
        let len = line.length;

        // Wall surfaces: tangent runs along the line, bitangent is the
        // world up axis, normal faces away from the side's sector.
        if len > 0.0 {
            let t = [(dir[0] / len) as f32, (dir[1] / len) as f32, 0.0];
            for (side_id, sign) in [(front, 1.0f32), (back, -1.0f32)] {
                if let Some(side_id) = side_id {
                    let side = self.side_mut(side_id)?;
                    let normal = [sign * t[1], sign * -t[0], 0.0];
                    for surface in [&mut side.top, &mut side.middle, &mut side.bottom] {
                        surface.tangent = t;
                        surface.bitangent = [0.0, 0.0, 1.0];
                        surface.normal = normal;
                    }
                }
            }
        }
        Ok(())
    }

    /// Rebuilds a sector's bounding box from its line list.
    pub fn refresh_sector_bounds(&mut self, id: SectorId) -> Result<(), DmuError> {
        let mut bounds = Aabb::new_empty();
        for &line_id in &self.sector(id)?.lines {
            bounds.combine(&self.line(line_id)?.bounds);
        }
        self.sector_mut(id)?.bounds = bounds;
        Ok(())
    }

    /// Wires up all derived state after construction or conversion:
    /// line geometry, sector line lists, sector bounds.
    pub fn link(&mut self) {
        for sector in &mut self.sectors {
            sector.lines.clear();
        }
        for index in 0..self.lines.len() {
            // Lines over missing vertices are construction bugs; skip
            // them here, the accessors will report them loudly.
            let _ = self.refresh_line(LineId(index as u32));
        }
        for index in 0..self.lines.len() {
            let id = LineId(index as u32);
            let line = &self.lines[index];
            for side_id in [line.front, line.back].into_iter().flatten() {
                if let Some(sector_id) = self.sides[side_id.index()].sector {
                    if let Some(sector) = self.sectors.get_mut(sector_id.index()) {
                        if !sector.lines.contains(&id) {
                            sector.lines.push(id);
                        }
                    }
                }
            }
        }
        for index in 0..self.sectors.len() {
            let _ = self.refresh_sector_bounds(SectorId(index as u32));
        }
    }

    /// Attaches a pre-built BSP tree (construction happens at conversion
    /// time, outside this crate) and back-fills sector leaf lists.
    pub fn attach_bsp(&mut self, tree: BspTree) {
        for sector in &mut self.sectors {
            sector.leafs.clear();
        }
        for (index, leaf) in tree.leafs().iter().enumerate() {
            if let Some(sector) = self.sectors.get_mut(leaf.sector.index()) {
                sector.leafs.push(crate::dmu::handle::LeafId(index as u32));
            }
        }
        self.bsp = Some(tree);
    }

    pub fn build_blockmap(&mut self) {
        self.blockmap = Some(Blockmap::build(self));
    }

    // --- Queries over relationships ---

    pub fn front_sector(&self, id: LineId) -> Option<SectorId> {
        let line = self.lines.get(id.index())?;
        self.sides.get(line.front?.index())?.sector
    }

    pub fn back_sector(&self, id: LineId) -> Option<SectorId> {
        let line = self.lines.get(id.index())?;
        self.sides.get(line.back?.index())?.sector
    }

    /// True if both sides of the line face the same sector.
    pub fn is_self_referencing(&self, id: LineId) -> bool {
        match (self.front_sector(id), self.back_sector(id)) {
            (Some(f), Some(b)) => f == b,
            _ => false,
        }
    }

    pub fn is_zero_length(&self, id: LineId) -> bool {
        self.lines
            .get(id.index())
            .map(|l| l.is_zero_length())
            .unwrap_or(true)
    }

    /// Wrapping-add checksum over all geometry, computed in parallel.
    /// Useful for change detection and save validation.
    pub fn checksum(&self) -> u32 {
        let mut checksum = 0u32;
        checksum = checksum.wrapping_add(
            self.vertices
                .par_iter()
                .map(|v| (v.origin[0].to_bits() ^ v.origin[1].to_bits()) as u32)
                .reduce(|| 0, u32::wrapping_add),
        );
        checksum = checksum.wrapping_add(
            self.lines
                .par_iter()
                .map(|l| {
                    (l.v[0].0)
                        .wrapping_add(l.v[1].0.rotate_left(8))
                        .wrapping_add(l.flags as u32)
                        .wrapping_add(l.tag as u32)
                })
                .reduce(|| 0, u32::wrapping_add),
        );
        checksum = checksum.wrapping_add(
            self.sectors
                .par_iter()
                .map(|s| {
                    (s.floor_height().to_bits() as u32)
                        .wrapping_add(s.ceiling_height().to_bits() as u32)
                        .wrapping_add(s.light_level.to_bits())
                        .wrapping_add(s.tag as u32)
                })
                .reduce(|| 0, u32::wrapping_add),
        );
        checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square 128x128 room, one sector, four one-sided lines.
    pub(crate) fn square_room() -> Map {
        let mut map = Map::new();
        let s = map.add_sector(0.0, 128.0, 1.0);
        let v = [
            map.add_vertex(0.0, 0.0),
            map.add_vertex(128.0, 0.0),
            map.add_vertex(128.0, 128.0),
            map.add_vertex(0.0, 128.0),
        ];
        for i in 0..4 {
            let line = map.add_line(v[i], v[(i + 1) % 4]);
            map.add_side(line, 0, Some(s)).unwrap();
        }
        map.link();
        map
    }

    #[test]
    fn test_empty_map() {
        let map = Map::new();
        assert_eq!(map.vertex_count(), 0);
        assert_eq!(map.line_count(), 0);
        assert_eq!(map.sector_count(), 0);
        assert_eq!(map.side_count(), 0);
    }

    #[test]
    fn test_link_builds_sector_state() {
        let map = square_room();
        let sector = map.sector(SectorId(0)).unwrap();
        assert_eq!(sector.lines.len(), 4);
        assert_eq!(sector.bounds, Aabb::from_points([0.0, 0.0], [128.0, 128.0]));
        for line in map.lines() {
            assert_eq!(line.length, 128.0);
        }
    }

    #[test]
    fn test_out_of_range_lookup_fails() {
        let map = square_room();
        assert_eq!(
            map.vertex(VertexId(99)),
            Err(DmuError::IndexOutOfRange {
                ty: ElementType::Vertex,
                index: 99,
                count: 4
            })
        );
    }

    #[test]
    fn test_self_referencing_detection() {
        let mut map = Map::new();
        let s = map.add_sector(0.0, 64.0, 1.0);
        let a = map.add_vertex(0.0, 0.0);
        let b = map.add_vertex(64.0, 0.0);
        let line = map.add_line(a, b);
        map.add_side(line, 0, Some(s)).unwrap();
        map.add_side(line, 1, Some(s)).unwrap();
        map.link();
        assert!(map.is_self_referencing(line));
    }

    #[test]
    fn test_checksum_tracks_changes() {
        let mut map = square_room();
        let before = map.checksum();
        map.sector_mut(SectorId(0)).unwrap().planes[0].height = 8.0;
        assert_ne!(before, map.checksum());
    }

    #[test]
    fn test_wall_tangent_frames() {
        let map = square_room();
        // First line runs east along +X; its front surface tangent
        // follows the line and the bitangent is world up.
        let side = map.side(SideId(0)).unwrap();
        assert_eq!(side.middle.tangent, [1.0, 0.0, 0.0]);
        assert_eq!(side.middle.bitangent, [0.0, 0.0, 1.0]);
    }
}

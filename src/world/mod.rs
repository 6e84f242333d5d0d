// src/world/mod.rs
//
// The World is the explicit context every accessor call runs against: one
// map, its material bank, its dummy pool, and an optional change sink.
// There is no process-wide current map; callers hold a World and pass it
// around.

use std::ffi::c_void;

use crate::bsp;
use crate::dmu::dummy::{DummyPool, DummyRef};
use crate::dmu::handle::{
    ElementRef, ElementType, LeafId, LineId, MaterialId, NodeId, PlaneId, SectorId, SideId,
    VertexId,
};
use crate::errors::DmuError;
use crate::map::{Map, MaterialBank};
use crate::utils::Aabb;

/// Receiver for change notifications flushed at the end of a write call.
/// Each method fires at most once per distinct element per call, however
/// many values the call carried.
pub trait UpdateSink {
    fn line_changed(&mut self, _id: LineId) {}
    fn side_changed(&mut self, _id: SideId) {}
    fn sector_changed(&mut self, _id: SectorId) {}
    fn surface_changed(&mut self, _id: crate::dmu::handle::SurfaceId) {}
}

/// External provider of mobile thinkers for box queries. Thinkers live
/// outside this crate; they are identified here by an opaque index.
pub trait ThinkerSource {
    /// Calls back for each thinker positioned inside the box. A `true`
    /// return stops the walk.
    fn mobjs_in_box(&self, bounds: &Aabb, callback: &mut dyn FnMut(u32) -> bool) -> bool;
}

/// Relationships walkable through [`World::iterate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    SectorLines,
    SectorPlanes,
    SectorLeafs,
    LeafLines,
}

pub struct World {
    pub(crate) map: Map,
    pub(crate) materials: MaterialBank,
    pub(crate) dummies: DummyPool,
    pub(crate) sink: Option<Box<dyn UpdateSink>>,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> Self {
        World {
            map: Map::new(),
            materials: MaterialBank::new(),
            dummies: DummyPool::new(),
            sink: None,
        }
    }

    pub fn with_map(map: Map) -> Self {
        World {
            map,
            ..World::new()
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn materials(&self) -> &MaterialBank {
        &self.materials
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn UpdateSink>>) {
        self.sink = sink;
    }

    // --- Dummies ---

    pub fn allocate_dummy(
        &mut self,
        ty: ElementType,
        extra: *mut c_void,
    ) -> Result<DummyRef, DmuError> {
        self.dummies.allocate(ty, extra)
    }

    /// Frees a dummy; the returned extra-data pointer goes back to its
    /// owner.
    pub fn free_dummy(&mut self, r: DummyRef) -> Result<*mut c_void, DmuError> {
        self.dummies.free(r)
    }

    pub fn dummy_extra_data(&self, r: DummyRef) -> Result<*mut c_void, DmuError> {
        self.dummies.extra_data(r)
    }

    /// The caller-supplied payload behind a reference, or null when the
    /// reference is not a currently allocated dummy.
    pub fn extra_data(&self, r: ElementRef) -> *mut c_void {
        match r {
            ElementRef::Dummy(d) => self
                .dummies
                .extra_data(d)
                .unwrap_or(std::ptr::null_mut()),
            _ => std::ptr::null_mut(),
        }
    }

    pub fn is_dummy(&self, r: ElementRef) -> bool {
        matches!(r, ElementRef::Dummy(d) if self.dummies.contains(d))
    }

    // --- The element/index/type mapping ---

    /// The type a reference currently answers as. For dummies the pool is
    /// consulted first, so a freed dummy reports `None` rather than the
    /// type it used to imitate.
    pub fn type_of(&self, r: ElementRef) -> ElementType {
        match r {
            ElementRef::Dummy(d) => self.dummies.type_of(d).unwrap_or(ElementType::None),
            other => other.embedded_type(),
        }
    }

    /// The storage index behind a reference. Dummies all answer 0; planes
    /// answer their index within the owning sector; surfaces have no
    /// standalone index at all.
    pub fn index_of(&self, r: ElementRef) -> Result<usize, DmuError> {
        match r {
            ElementRef::None => Err(DmuError::NullRef),
            ElementRef::Vertex(id) => self.map.vertex(id).map(|_| id.index()),
            ElementRef::Line(id) => self.map.line(id).map(|_| id.index()),
            ElementRef::Side(id) => self.map.side(id).map(|_| id.index()),
            ElementRef::Sector(id) => self.map.sector(id).map(|_| id.index()),
            ElementRef::Plane(id) => self.map.plane(id).map(|_| id.plane as usize),
            ElementRef::Surface(_) => Err(DmuError::UnaddressableIndex(ElementType::Surface)),
            ElementRef::BspNode(id) => self.bsp_tree()?.node(id).map(|_| id.index()),
            ElementRef::BspLeaf(id) => self.bsp_tree()?.leaf(id).map(|_| id.index()),
            ElementRef::Material(id) => match self.materials.get(id) {
                Some(_) => Ok(id.index()),
                None => Err(DmuError::IndexOutOfRange {
                    ty: ElementType::Material,
                    index: id.index(),
                    count: self.materials.len(),
                }),
            },
            ElementRef::Dummy(d) => {
                if self.dummies.contains(d) {
                    Ok(0)
                } else {
                    Err(DmuError::NotADummy)
                }
            }
        }
    }

    /// The inverse mapping: a bounds-checked reference from a type and a
    /// storage index. Planes and surfaces are only reachable through their
    /// owners, never by bare index.
    pub fn ref_at(&self, ty: ElementType, index: usize) -> Result<ElementRef, DmuError> {
        let check = |count: usize| {
            if index < count {
                Ok(())
            } else {
                Err(DmuError::IndexOutOfRange { ty, index, count })
            }
        };
        match ty {
            ElementType::None => Err(DmuError::InvalidType(ElementType::None)),
            ElementType::Vertex => {
                check(self.map.vertex_count())?;
                Ok(ElementRef::Vertex(VertexId(index as u32)))
            }
            ElementType::Line => {
                check(self.map.line_count())?;
                Ok(ElementRef::Line(LineId(index as u32)))
            }
            ElementType::Side => {
                check(self.map.side_count())?;
                Ok(ElementRef::Side(SideId(index as u32)))
            }
            ElementType::Sector => {
                check(self.map.sector_count())?;
                Ok(ElementRef::Sector(SectorId(index as u32)))
            }
            ElementType::Plane => Err(DmuError::AmbiguousPlaneIndex),
            ElementType::Surface => Err(DmuError::UnaddressableIndex(ElementType::Surface)),
            ElementType::BspNode => {
                check(self.map.bsp().map(|t| t.nodes().len()).unwrap_or(0))?;
                Ok(ElementRef::BspNode(NodeId(index as u32)))
            }
            ElementType::BspLeaf => {
                check(self.map.bsp().map(|t| t.leafs().len()).unwrap_or(0))?;
                Ok(ElementRef::BspLeaf(LeafId(index as u32)))
            }
            ElementType::Material => {
                check(self.materials.len())?;
                Ok(ElementRef::Material(MaterialId(index as u32)))
            }
        }
    }

    fn bsp_tree(&self) -> Result<&crate::bsp::BspTree, DmuError> {
        self.map.bsp().ok_or(DmuError::NoBspTree)
    }

    // --- Spatial queries ---

    pub fn leaf_at(&self, p: [f64; 2]) -> Result<LeafId, DmuError> {
        Ok(self.bsp_tree()?.leaf_at(p))
    }

    pub fn sector_at(&self, p: [f64; 2]) -> Result<SectorId, DmuError> {
        let leaf = self.leaf_at(p)?;
        Ok(self.bsp_tree()?.leaf(leaf)?.sector)
    }

    pub fn check_sight(
        &self,
        from: [f64; 3],
        to: [f64; 3],
        bottom_slope: f64,
        top_slope: f64,
        flags: u32,
    ) -> Result<bool, DmuError> {
        bsp::check_sight(&self.map, from, to, bottom_slope, top_slope, flags)
    }

    /// Calls back for every line whose bounding box touches the query box.
    /// Uses the blockmap when one has been built, otherwise scans. A
    /// `true` return stops the walk; the stop is reported to the caller.
    pub fn lines_box_iterator(
        &self,
        bounds: &Aabb,
        mut callback: impl FnMut(LineId) -> bool,
    ) -> bool {
        if let Some(blockmap) = self.map.blockmap() {
            return blockmap.lines_in_box(bounds, callback);
        }
        for (index, line) in self.map.lines().iter().enumerate() {
            if line.bounds.intersects(bounds) && callback(LineId(index as u32)) {
                return true;
            }
        }
        false
    }

    /// Calls back for every sector whose bounding box touches the query
    /// box.
    pub fn sectors_box_iterator(
        &self,
        bounds: &Aabb,
        mut callback: impl FnMut(SectorId) -> bool,
    ) -> bool {
        for (index, sector) in self.map.sectors().iter().enumerate() {
            if sector.bounds.intersects(bounds) && callback(SectorId(index as u32)) {
                return true;
            }
        }
        false
    }

    /// Box query over mobile thinkers, delegated to their owner.
    pub fn mobjs_box_iterator(
        &self,
        source: &dyn ThinkerSource,
        bounds: &Aabb,
        callback: &mut dyn FnMut(u32) -> bool,
    ) -> bool {
        source.mobjs_in_box(bounds, callback)
    }

    // --- The iteration protocol ---

    /// Walks the elements related to `base`, in storage order. The
    /// callback returning `true` stops the walk early; `Ok(true)` reports
    /// that an invocation stopped it.
    pub fn iterate(
        &self,
        base: ElementRef,
        relation: Relation,
        mut callback: impl FnMut(ElementRef) -> bool,
    ) -> Result<bool, DmuError> {
        match relation {
            Relation::SectorLines => {
                let id = self.expect_sector(base)?;
                for &line in &self.map.sector(id)?.lines {
                    if callback(ElementRef::Line(line)) {
                        return Ok(true);
                    }
                }
            }
            Relation::SectorPlanes => {
                let id = self.expect_sector(base)?;
                for plane in 0..self.map.sector(id)?.planes.len() {
                    let r = ElementRef::Plane(PlaneId {
                        sector: id,
                        plane: plane as u16,
                    });
                    if callback(r) {
                        return Ok(true);
                    }
                }
            }
            Relation::SectorLeafs => {
                let id = self.expect_sector(base)?;
                for &leaf in &self.map.sector(id)?.leafs {
                    if callback(ElementRef::BspLeaf(leaf)) {
                        return Ok(true);
                    }
                }
            }
            Relation::LeafLines => {
                let ElementRef::BspLeaf(id) = base else {
                    return Err(DmuError::InvalidType(self.type_of(base)));
                };
                let leaf = self.bsp_tree()?.leaf(id)?;
                let mut visited = vec![false; self.map.line_count()];
                for hedge in &leaf.hedges {
                    let Some(line) = hedge.line else { continue };
                    if line.index() >= visited.len() || visited[line.index()] {
                        continue;
                    }
                    visited[line.index()] = true;
                    if callback(ElementRef::Line(line)) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    fn expect_sector(&self, base: ElementRef) -> Result<SectorId, DmuError> {
        match base {
            ElementRef::Sector(id) => Ok(id),
            other => Err(DmuError::InvalidType(self.type_of(other))),
        }
    }

    /// Walks every sector or line carrying the tag, in storage order.
    pub fn iterate_tagged(
        &self,
        ty: ElementType,
        tag: i32,
        mut callback: impl FnMut(ElementRef) -> bool,
    ) -> Result<bool, DmuError> {
        match ty {
            ElementType::Sector => {
                for (index, sector) in self.map.sectors().iter().enumerate() {
                    if sector.tag == tag && callback(ElementRef::Sector(SectorId(index as u32))) {
                        return Ok(true);
                    }
                }
            }
            ElementType::Line => {
                for (index, line) in self.map.lines().iter().enumerate() {
                    if line.tag == tag && callback(ElementRef::Line(LineId(index as u32))) {
                        return Ok(true);
                    }
                }
            }
            other => return Err(DmuError::InvalidType(other)),
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::test_support::split_room_tree;

    fn square_world() -> World {
        let mut map = Map::new();
        let s = map.add_sector(0.0, 128.0, 1.0);
        let v = [
            map.add_vertex(0.0, 0.0),
            map.add_vertex(256.0, 0.0),
            map.add_vertex(256.0, 128.0),
            map.add_vertex(0.0, 128.0),
        ];
        for i in 0..4 {
            let line = map.add_line(v[i], v[(i + 1) % 4]);
            map.add_side(line, 0, Some(s)).unwrap();
        }
        map.link();
        map.attach_bsp(split_room_tree(s));
        World::with_map(map)
    }

    #[test]
    fn test_index_ref_round_trip() {
        let world = square_world();
        let r = world.ref_at(ElementType::Line, 2).unwrap();
        assert_eq!(r, ElementRef::Line(LineId(2)));
        assert_eq!(world.index_of(r), Ok(2));

        assert_eq!(
            world.ref_at(ElementType::Line, 99),
            Err(DmuError::IndexOutOfRange {
                ty: ElementType::Line,
                index: 99,
                count: 4
            })
        );
    }

    #[test]
    fn test_planes_have_no_bare_index() {
        let world = square_world();
        assert_eq!(
            world.ref_at(ElementType::Plane, 0),
            Err(DmuError::AmbiguousPlaneIndex)
        );
        // But a plane reference reports its index within the sector.
        let floor = ElementRef::Plane(PlaneId {
            sector: SectorId(0),
            plane: 0,
        });
        assert_eq!(world.index_of(floor), Ok(0));
    }

    #[test]
    fn test_type_of_freed_dummy_is_none() {
        let mut world = square_world();
        let d = world
            .allocate_dummy(ElementType::Sector, std::ptr::null_mut())
            .unwrap();
        let r = ElementRef::Dummy(d);
        assert_eq!(world.type_of(r), ElementType::Sector);
        assert_eq!(world.index_of(r), Ok(0));

        world.free_dummy(d).unwrap();
        assert_eq!(world.type_of(r), ElementType::None);
        assert!(!world.is_dummy(r));
    }

    #[test]
    fn test_extra_data_is_null_for_non_dummies() {
        let mut world = square_world();
        let payload = Box::into_raw(Box::new(7u8)) as *mut std::ffi::c_void;
        let d = world.allocate_dummy(ElementType::Line, payload).unwrap();

        assert_eq!(world.extra_data(ElementRef::Dummy(d)), payload);
        assert!(world.extra_data(ElementRef::Line(LineId(0))).is_null());
        assert!(world.extra_data(ElementRef::None).is_null());

        let returned = world.free_dummy(d).unwrap();
        assert!(world.extra_data(ElementRef::Dummy(d)).is_null());
        drop(unsafe { Box::from_raw(returned as *mut u8) });
    }

    #[test]
    fn test_sector_at_point() {
        let world = square_world();
        assert_eq!(world.sector_at([64.0, 64.0]), Ok(SectorId(0)));
        assert_eq!(World::new().sector_at([0.0, 0.0]), Err(DmuError::NoBspTree));
    }

    #[test]
    fn test_iterate_sector_lines_early_stop() {
        let world = square_world();
        let sector = ElementRef::Sector(SectorId(0));

        let mut seen = Vec::new();
        let stopped = world
            .iterate(sector, Relation::SectorLines, |r| {
                seen.push(r);
                false
            })
            .unwrap();
        assert!(!stopped);
        assert_eq!(seen.len(), 4);

        let mut count = 0;
        let stopped = world
            .iterate(sector, Relation::SectorLines, |_| {
                count += 1;
                count == 2
            })
            .unwrap();
        assert!(stopped);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_iterate_sector_planes() {
        let world = square_world();
        let mut planes = Vec::new();
        world
            .iterate(ElementRef::Sector(SectorId(0)), Relation::SectorPlanes, |r| {
                planes.push(r);
                false
            })
            .unwrap();
        assert_eq!(planes.len(), 2);
        assert_eq!(
            planes[0],
            ElementRef::Plane(PlaneId {
                sector: SectorId(0),
                plane: 0
            })
        );
    }

    #[test]
    fn test_iterate_wrong_base_type() {
        let world = square_world();
        assert_eq!(
            world.iterate(ElementRef::Line(LineId(0)), Relation::SectorLines, |_| false),
            Err(DmuError::InvalidType(ElementType::Line))
        );
    }

    #[test]
    fn test_iterate_tagged_sectors() {
        let mut world = square_world();
        world.map_mut().sector_mut(SectorId(0)).unwrap().tag = 9;

        let mut hits = 0;
        world
            .iterate_tagged(ElementType::Sector, 9, |_| {
                hits += 1;
                false
            })
            .unwrap();
        assert_eq!(hits, 1);

        let mut misses = 0;
        world
            .iterate_tagged(ElementType::Sector, 4, |_| {
                misses += 1;
                false
            })
            .unwrap();
        assert_eq!(misses, 0);
    }

    #[test]
    fn test_lines_box_iterator_without_blockmap() {
        let world = square_world();
        let mut seen = Vec::new();
        world.lines_box_iterator(&Aabb::from_points([-1.0, -1.0], [10.0, 10.0]), |id| {
            seen.push(id);
            false
        });
        // The bottom and left lines touch the corner box.
        assert!(seen.contains(&LineId(0)));
        assert!(seen.contains(&LineId(3)));
    }
}

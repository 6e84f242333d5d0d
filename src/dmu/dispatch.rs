// src/dmu/dispatch.rs
//
// The generic accessor surface: every get/set funnels through here. A
// call splits its property id, redirects the reference through any
// modifier flags (always in the same order, so aliased redirections
// resolve identically on every call), dispatches to the element's own
// accessor, and marshals values through the coercion table. Writes
// collect the owners they dirtied and flush them exactly once at the end
// of the call, however many elements or components the call touched.

use std::collections::BTreeSet;
use std::ops::Range;

use crate::dmu::dummy::DummyPart;
use crate::dmu::handle::{
    ElementRef, ElementType, LineId, PlaneId, SectorId, SideId, SideSection, SurfaceId,
    PLANE_CEILING, PLANE_FLOOR,
};
use crate::dmu::property::{modifier, Property, PropertyId};
use crate::dmu::value::{Value, ValueKind};
use crate::errors::DmuError;
use crate::world::World;

/// An element whose derived state must be recomputed after a write. The
/// variant order is the flush order: line caches before the sector bounds
/// computed from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum OwnerKey {
    Line(LineId),
    Side(SideId),
    Sector(SectorId),
    Surface(SurfaceId),
}

impl World {
    // --- Reads ---

    pub fn get(
        &self,
        r: ElementRef,
        id: impl Into<PropertyId>,
        want: ValueKind,
    ) -> Result<Value, DmuError> {
        let (prop, values) = self.read(r, id.into())?;
        if values.len() != 1 {
            return Err(DmuError::ComponentCount {
                prop,
                expected: values.len(),
                got: 1,
            });
        }
        self.marshal_get(values[0], want)
    }

    pub fn getv(
        &self,
        r: ElementRef,
        id: impl Into<PropertyId>,
        want: ValueKind,
    ) -> Result<Vec<Value>, DmuError> {
        let (_, values) = self.read(r, id.into())?;
        values.iter().map(|&v| self.marshal_get(v, want)).collect()
    }

    pub fn get_at(
        &self,
        ty: ElementType,
        index: usize,
        id: impl Into<PropertyId>,
        want: ValueKind,
    ) -> Result<Value, DmuError> {
        let r = self.ref_at(ty, index)?;
        self.get(r, id, want)
    }

    // --- Writes ---

    pub fn set(
        &mut self,
        r: ElementRef,
        id: impl Into<PropertyId>,
        value: Value,
    ) -> Result<(), DmuError> {
        self.setv(r, id, &[value])
    }

    pub fn setv(
        &mut self,
        r: ElementRef,
        id: impl Into<PropertyId>,
        values: &[Value],
    ) -> Result<(), DmuError> {
        let mut owners = BTreeSet::new();
        self.apply(r, id.into(), values, &mut owners)?;
        self.flush(owners)
    }

    pub fn set_at(
        &mut self,
        ty: ElementType,
        index: usize,
        id: impl Into<PropertyId>,
        value: Value,
    ) -> Result<(), DmuError> {
        let r = self.ref_at(ty, index)?;
        self.set(r, id, value)
    }

    /// Batch write: the same property and value over a storage-index
    /// range. Owner invalidation still fires once per distinct owner for
    /// the whole call.
    pub fn set_each(
        &mut self,
        ty: ElementType,
        range: Range<usize>,
        id: impl Into<PropertyId>,
        values: &[Value],
    ) -> Result<(), DmuError> {
        let pid = id.into();
        let mut owners = BTreeSet::new();
        for index in range {
            let r = self.ref_at(ty, index)?;
            self.apply(r, pid, values, &mut owners)?;
        }
        self.flush(owners)
    }

    // --- The pipeline ---

    fn split(&self, r: ElementRef, pid: PropertyId) -> Result<(Property, u32), DmuError> {
        match pid.split() {
            (Some(prop), mods) => Ok((prop, mods)),
            (None, _) => Err(DmuError::UnknownProperty {
                ty: self.type_of(r),
                prop: Property::None,
            }),
        }
    }

    fn read(&self, r: ElementRef, pid: PropertyId) -> Result<(Property, Vec<Value>), DmuError> {
        let (prop, mods) = self.split(r, pid)?;
        let target = self.redirect(r, mods)?;
        Ok((prop, self.read_target(target, prop)?))
    }

    fn apply(
        &mut self,
        r: ElementRef,
        pid: PropertyId,
        values: &[Value],
        owners: &mut BTreeSet<OwnerKey>,
    ) -> Result<(), DmuError> {
        let (prop, mods) = self.split(r, pid)?;
        let expected = prop.component_count();
        if values.len() != expected {
            return Err(DmuError::ComponentCount {
                prop,
                expected,
                got: values.len(),
            });
        }
        let target = self.redirect(r, mods)?;
        let values = self.marshal_set(prop, values)?;
        if self.write_target(target, prop, &values)? {
            self.collect_owners(target, owners);
        }
        Ok(())
    }

    /// Applies modifier flags to the reference, group by group in fixed
    /// order: line to side, sector to plane, side to surface. Floor wins
    /// over ceiling, side 0 over side 1, top over middle over bottom. A
    /// group that does not apply to the working type is a fatal error.
    fn redirect(&self, r: ElementRef, mods: u32) -> Result<ElementRef, DmuError> {
        let mut target = r;

        if mods & modifier::LINE_GROUP != 0 {
            let which = usize::from(mods & modifier::SIDE0_OF_LINE == 0);
            target = match target {
                ElementRef::Line(id) => match self.map.line(id)?.side(which) {
                    Some(side) => ElementRef::Side(side),
                    None => return Err(DmuError::NullRef),
                },
                ElementRef::Dummy(d) if d.type_tag() == ElementType::Line => {
                    ElementRef::Dummy(d.with_part(DummyPart::Side(which as u8)))
                }
                other => {
                    return Err(DmuError::BadRedirect {
                        ty: self.type_of(other),
                        modifiers: mods & modifier::LINE_GROUP,
                    })
                }
            };
        }

        if mods & modifier::SECTOR_GROUP != 0 {
            let plane = if mods & modifier::FLOOR_OF_SECTOR != 0 {
                PLANE_FLOOR
            } else {
                PLANE_CEILING
            };
            target = match target {
                ElementRef::Sector(id) => {
                    self.map.sector(id)?;
                    ElementRef::Plane(PlaneId { sector: id, plane })
                }
                ElementRef::Dummy(d) if d.type_tag() == ElementType::Sector => {
                    ElementRef::Dummy(d.with_part(DummyPart::Plane(plane)))
                }
                other => {
                    return Err(DmuError::BadRedirect {
                        ty: self.type_of(other),
                        modifiers: mods & modifier::SECTOR_GROUP,
                    })
                }
            };
        }

        if mods & modifier::SIDE_GROUP != 0 {
            let section = if mods & modifier::TOP_OF_SIDE != 0 {
                SideSection::Top
            } else if mods & modifier::MIDDLE_OF_SIDE != 0 {
                SideSection::Middle
            } else {
                SideSection::Bottom
            };
            target = match target {
                ElementRef::Side(id) => {
                    self.map.side(id)?;
                    ElementRef::Surface(SurfaceId::Side(id, section))
                }
                ElementRef::Dummy(d) if d.type_tag() == ElementType::Side => {
                    let part = match d.part {
                        DummyPart::Whole => DummyPart::Surface(section),
                        DummyPart::Side(i) => DummyPart::SideSurface(i, section),
                        _ => return Err(DmuError::InvalidType(ElementType::Side)),
                    };
                    ElementRef::Dummy(d.with_part(part))
                }
                other => {
                    return Err(DmuError::BadRedirect {
                        ty: self.type_of(other),
                        modifiers: mods & modifier::SIDE_GROUP,
                    })
                }
            };
        }

        Ok(target)
    }

    fn read_target(&self, target: ElementRef, prop: Property) -> Result<Vec<Value>, DmuError> {
        match target {
            ElementRef::None => Err(DmuError::NullRef),
            ElementRef::Vertex(id) => self.map.vertex(id)?.property(prop),
            ElementRef::Line(id) => self.map.line(id)?.property(prop),
            ElementRef::Side(id) => self.map.side(id)?.property(prop),
            ElementRef::Sector(id) => self.map.sector(id)?.property(id, prop),
            ElementRef::Plane(id) => self.map.plane(id)?.property(prop),
            ElementRef::Surface(SurfaceId::Side(id, section)) => {
                self.map.side(id)?.surface(section).property(prop)
            }
            ElementRef::Surface(SurfaceId::Plane(id)) => {
                self.map.plane(id)?.surface.property(prop)
            }
            ElementRef::Material(id) => self
                .materials
                .get(id)
                .ok_or(DmuError::IndexOutOfRange {
                    ty: ElementType::Material,
                    index: id.index(),
                    count: self.materials.len(),
                })?
                .property(prop),
            ElementRef::BspNode(_) | ElementRef::BspLeaf(_) => Err(DmuError::UnknownProperty {
                ty: target.embedded_type(),
                prop,
            }),
            ElementRef::Dummy(d) => self.dummies.read_property(d, prop),
        }
    }

    fn write_target(
        &mut self,
        target: ElementRef,
        prop: Property,
        values: &[Value],
    ) -> Result<bool, DmuError> {
        match target {
            ElementRef::None => Err(DmuError::NullRef),
            ElementRef::Vertex(id) => self.map.vertex_mut(id)?.set_property(prop, values),
            ElementRef::Line(id) => self.map.line_mut(id)?.set_property(prop, values),
            ElementRef::Side(id) => self.map.side_mut(id)?.set_property(prop, values),
            ElementRef::Sector(id) => self.map.sector_mut(id)?.set_property(id, prop, values),
            ElementRef::Plane(id) => self.map.plane_mut(id)?.set_property(prop, values),
            ElementRef::Surface(SurfaceId::Side(id, section)) => self
                .map
                .side_mut(id)?
                .surface_mut(section)
                .set_property(prop, values),
            ElementRef::Surface(SurfaceId::Plane(id)) => {
                self.map.plane_mut(id)?.surface.set_property(prop, values)
            }
            ElementRef::Material(id) => {
                let mat = self.materials.get(id).ok_or(DmuError::IndexOutOfRange {
                    ty: ElementType::Material,
                    index: id.index(),
                    count: self.materials.len(),
                })?;
                Err(if mat.property(prop).is_ok() {
                    DmuError::NotWritable {
                        ty: ElementType::Material,
                        prop,
                    }
                } else {
                    DmuError::UnknownProperty {
                        ty: ElementType::Material,
                        prop,
                    }
                })
            }
            ElementRef::BspNode(_) | ElementRef::BspLeaf(_) => Err(DmuError::UnknownProperty {
                ty: target.embedded_type(),
                prop,
            }),
            ElementRef::Dummy(d) => self.dummies.write_property(d, prop, values),
        }
    }

    // --- Value marshaling ---

    /// Outbound coercion. Element values asked for in a numeric kind go
    /// through the element-to-index mapping first; that is the only
    /// sanctioned element-to-number conversion.
    fn marshal_get(&self, value: Value, want: ValueKind) -> Result<Value, DmuError> {
        if want != ValueKind::Element {
            if let Value::Element(r) = value {
                return Value::Int(self.index_of(r)? as i32).coerce(want);
            }
        }
        value.coerce(want)
    }

    /// Inbound conversion for element-valued properties: a bare integer is
    /// resolved against the property's target type, bounds-checked, before
    /// the element accessor ever sees it.
    fn marshal_set(&self, prop: Property, values: &[Value]) -> Result<Vec<Value>, DmuError> {
        let Some(target_ty) = prop.element_target() else {
            return Ok(values.to_vec());
        };
        values
            .iter()
            .map(|&v| {
                Ok(match v {
                    Value::Element(_) => v,
                    Value::Int(i) => Value::Element(self.ref_at(target_ty, i as usize)?),
                    Value::Short(i) => Value::Element(self.ref_at(target_ty, i as usize)?),
                    Value::Byte(i) => Value::Element(self.ref_at(target_ty, i as usize)?),
                    other => {
                        return Err(DmuError::BadCoercion {
                            from: other.kind(),
                            to: ValueKind::Element,
                        })
                    }
                })
            })
            .collect()
    }

    // --- Owner invalidation ---

    fn collect_owners(&self, target: ElementRef, owners: &mut BTreeSet<OwnerKey>) {
        match target {
            ElementRef::Vertex(id) => {
                // A moved vertex dirties every line built on it, and the
                // sectors those lines bound.
                for (index, line) in self.map.lines().iter().enumerate() {
                    if line.v[0] != id && line.v[1] != id {
                        continue;
                    }
                    owners.insert(OwnerKey::Line(LineId(index as u32)));
                    for side in [line.front, line.back].into_iter().flatten() {
                        if let Some(sector) = self.map.sides().get(side.index()).and_then(|s| s.sector)
                        {
                            owners.insert(OwnerKey::Sector(sector));
                        }
                    }
                }
            }
            ElementRef::Line(id) => {
                owners.insert(OwnerKey::Line(id));
                if let Ok(line) = self.map.line(id) {
                    for side in [line.front, line.back].into_iter().flatten() {
                        if let Some(sector) = self.map.sides().get(side.index()).and_then(|s| s.sector)
                        {
                            owners.insert(OwnerKey::Sector(sector));
                        }
                    }
                }
            }
            ElementRef::Side(id) => {
                owners.insert(OwnerKey::Side(id));
            }
            ElementRef::Sector(id) => {
                owners.insert(OwnerKey::Sector(id));
            }
            ElementRef::Plane(id) => {
                owners.insert(OwnerKey::Sector(id.sector));
            }
            ElementRef::Surface(id) => {
                owners.insert(OwnerKey::Surface(id));
                match id {
                    SurfaceId::Plane(plane) => {
                        owners.insert(OwnerKey::Sector(plane.sector));
                    }
                    SurfaceId::Side(side_id, _) => {
                        // A wall surface dirties its side, and through it
                        // the owning line and the side's sector.
                        owners.insert(OwnerKey::Side(side_id));
                        if let Ok(side) = self.map.side(side_id) {
                            owners.insert(OwnerKey::Line(side.line));
                            if let Some(sector) = side.sector {
                                owners.insert(OwnerKey::Sector(sector));
                            }
                        }
                    }
                }
            }
            // Dummies and bank entries have no derived map state.
            _ => {}
        }
    }

    fn flush(&mut self, owners: BTreeSet<OwnerKey>) -> Result<(), DmuError> {
        for owner in &owners {
            match *owner {
                OwnerKey::Line(id) => self.map.refresh_line(id)?,
                OwnerKey::Sector(id) => self.map.refresh_sector_bounds(id)?,
                OwnerKey::Side(_) | OwnerKey::Surface(_) => {}
            }
        }
        if let Some(sink) = self.sink.as_mut() {
            for owner in owners {
                match owner {
                    OwnerKey::Line(id) => sink.line_changed(id),
                    OwnerKey::Side(id) => sink.side_changed(id),
                    OwnerKey::Sector(id) => sink.sector_changed(id),
                    OwnerKey::Surface(id) => sink.surface_changed(id),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use assert_approx_eq::assert_approx_eq;

    use crate::dmu::handle::VertexId;
    use crate::dmu::value::BlendMode;
    use crate::fixed::Fixed;
    use crate::map::Map;
    use crate::world::UpdateSink;

    /// Two-sector map: a 128x128 room (sector 0) sharing its east wall
    /// with a second room (sector 1). Line 0 is the shared two-sided
    /// line; side 0 faces sector 0.
    fn two_room_world() -> World {
        let mut map = Map::new();
        let s0 = map.add_sector(0.0, 128.0, 1.0);
        let s1 = map.add_sector(16.0, 112.0, 0.5);

        let v = [
            map.add_vertex(128.0, 0.0),
            map.add_vertex(128.0, 128.0),
            map.add_vertex(0.0, 0.0),
            map.add_vertex(0.0, 128.0),
            map.add_vertex(256.0, 0.0),
            map.add_vertex(256.0, 128.0),
        ];

        let shared = map.add_line(v[0], v[1]);
        map.add_side(shared, 0, Some(s0)).unwrap();
        map.add_side(shared, 1, Some(s1)).unwrap();

        for &(a, b, s) in &[
            (v[2], v[0], s0),
            (v[1], v[3], s0),
            (v[3], v[2], s0),
            (v[0], v[4], s1),
            (v[4], v[5], s1),
            (v[5], v[1], s1),
        ] {
            let line = map.add_line(a, b);
            map.add_side(line, 0, Some(s)).unwrap();
        }
        map.link();
        World::with_map(map)
    }

    #[test]
    fn test_scalar_get_set_with_coercion() {
        let mut world = two_room_world();
        let sector = ElementRef::Sector(SectorId(0));
        let floor_height = PropertyId::new(Property::Height, modifier::FLOOR_OF_SECTOR);

        world.set(sector, floor_height, Value::Int(32)).unwrap();
        assert_eq!(
            world.get(sector, floor_height, ValueKind::Double),
            Ok(Value::Double(32.0))
        );
        assert_eq!(
            world.get(sector, floor_height, ValueKind::Fixed),
            Ok(Value::Fixed(Fixed::from_int(32)))
        );
        assert_eq!(
            world.get(sector, floor_height, ValueKind::Bool),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_redirection_is_deterministic() {
        let world = two_room_world();
        let sector = ElementRef::Sector(SectorId(0));
        let floor = PropertyId::new(Property::Height, modifier::FLOOR_OF_SECTOR);
        let ceiling = PropertyId::new(Property::Height, modifier::CEILING_OF_SECTOR);

        let first = world.get(sector, floor, ValueKind::Double).unwrap();
        for _ in 0..8 {
            assert_eq!(world.get(sector, floor, ValueKind::Double), Ok(first));
        }
        assert_eq!(
            world.get(sector, ceiling, ValueKind::Double),
            Ok(Value::Double(128.0))
        );
    }

    #[test]
    fn test_redirect_through_line_to_surface() {
        let mut world = two_room_world();
        let line = ElementRef::Line(LineId(0));
        let id = PropertyId::new(
            Property::Alpha,
            modifier::SIDE0_OF_LINE | modifier::MIDDLE_OF_SIDE,
        );

        world.set(line, id, Value::Float(0.25)).unwrap();
        assert_eq!(world.get(line, id, ValueKind::Float), Ok(Value::Float(0.25)));
        // The other side's surface is untouched.
        let other = PropertyId::new(
            Property::Alpha,
            modifier::SIDE1_OF_LINE | modifier::MIDDLE_OF_SIDE,
        );
        assert_eq!(
            world.get(line, other, ValueKind::Float),
            Ok(Value::Float(1.0))
        );
    }

    #[test]
    fn test_redirect_wrong_type_is_fatal() {
        let world = two_room_world();
        let vertex = ElementRef::Vertex(VertexId(0));
        assert_eq!(
            world.get(
                vertex,
                PropertyId::new(Property::Height, modifier::FLOOR_OF_SECTOR),
                ValueKind::Double
            ),
            Err(DmuError::BadRedirect {
                ty: ElementType::Vertex,
                modifiers: modifier::FLOOR_OF_SECTOR,
            })
        );
    }

    #[test]
    fn test_redirect_to_missing_side_is_null() {
        let world = two_room_world();
        // Line 1 is one-sided; its back does not exist.
        let line = ElementRef::Line(LineId(1));
        assert_eq!(
            world.get(
                line,
                PropertyId::new(Property::Flags, modifier::SIDE1_OF_LINE),
                ValueKind::Int
            ),
            Err(DmuError::NullRef)
        );
    }

    #[test]
    fn test_element_reads_as_index() {
        let world = two_room_world();
        let line = ElementRef::Line(LineId(0));
        assert_eq!(
            world.get(line, Property::Front, ValueKind::Int),
            Ok(Value::Int(0))
        );
        assert_eq!(
            world.get(line, Property::Back, ValueKind::Element),
            Ok(Value::Element(ElementRef::Side(SideId(1))))
        );
        // The side's sector, as an index.
        let side = ElementRef::Side(SideId(1));
        assert_eq!(
            world.get(side, Property::Sector, ValueKind::Int),
            Ok(Value::Int(1))
        );
    }

    #[test]
    fn test_index_writes_resolve_to_elements() {
        let mut world = two_room_world();
        let side = ElementRef::Side(SideId(0));
        world.set(side, Property::Sector, Value::Int(1)).unwrap();
        assert_eq!(
            world.get(side, Property::Sector, ValueKind::Element),
            Ok(Value::Element(ElementRef::Sector(SectorId(1))))
        );

        assert_eq!(
            world.set(side, Property::Sector, Value::Int(99)),
            Err(DmuError::IndexOutOfRange {
                ty: ElementType::Sector,
                index: 99,
                count: 2
            })
        );
    }

    #[test]
    fn test_vertex_write_refreshes_line_caches() {
        let mut world = two_room_world();
        assert_approx_eq!(world.map().line(LineId(0)).unwrap().length, 128.0);

        // Stretch the shared line by moving its first vertex through the
        // accessor; the cached length must follow in the same call.
        let vertex = ElementRef::Vertex(VertexId(0));
        world
            .setv(vertex, Property::Xy, &[Value::Double(128.0), Value::Double(-64.0)])
            .unwrap();
        assert_approx_eq!(world.map().line(LineId(0)).unwrap().length, 192.0);
    }

    #[derive(Default)]
    struct Counts {
        lines: usize,
        sides: usize,
        sectors: usize,
        surfaces: usize,
    }

    struct CountingSink(Rc<RefCell<Counts>>);

    impl UpdateSink for CountingSink {
        fn line_changed(&mut self, _id: LineId) {
            self.0.borrow_mut().lines += 1;
        }
        fn side_changed(&mut self, _id: SideId) {
            self.0.borrow_mut().sides += 1;
        }
        fn sector_changed(&mut self, _id: SectorId) {
            self.0.borrow_mut().sectors += 1;
        }
        fn surface_changed(&mut self, _id: SurfaceId) {
            self.0.borrow_mut().surfaces += 1;
        }
    }

    #[test]
    fn test_multi_component_write_notifies_once() {
        let mut world = two_room_world();
        let counts = Rc::new(RefCell::new(Counts::default()));
        world.set_sink(Some(Box::new(CountingSink(counts.clone()))));

        world
            .setv(
                ElementRef::Sector(SectorId(0)),
                Property::Color,
                &[Value::Float(0.5), Value::Float(0.5), Value::Float(0.5)],
            )
            .unwrap();
        assert_eq!(counts.borrow().sectors, 1);
    }

    #[test]
    fn test_batch_write_notifies_each_owner_once() {
        let mut world = two_room_world();
        let counts = Rc::new(RefCell::new(Counts::default()));
        world.set_sink(Some(Box::new(CountingSink(counts.clone()))));

        world
            .set_each(ElementType::Sector, 0..2, Property::LightLevel, &[Value::Float(0.8)])
            .unwrap();
        assert_eq!(counts.borrow().sectors, 2);

        // A vertex shared by several lines still dirties the common
        // sector only once.
        world
            .set(ElementRef::Vertex(VertexId(0)), Property::X, Value::Double(120.0))
            .unwrap();
        // Vertex 0 joins lines 0, 1 and 4; their sectors are 0 and 1.
        assert_eq!(counts.borrow().lines, 3);
        assert_eq!(counts.borrow().sectors, 4);
    }

    #[test]
    fn test_surface_write_notifies_surface() {
        let mut world = two_room_world();
        let counts = Rc::new(RefCell::new(Counts::default()));
        world.set_sink(Some(Box::new(CountingSink(counts.clone()))));

        world
            .set(
                ElementRef::Sector(SectorId(0)),
                PropertyId::new(Property::OffsetX, modifier::FLOOR_OF_SECTOR),
                Value::Double(8.0),
            )
            .unwrap();
        // The write lands on the plane's surface through the plane
        // accessor, so the dirty owner is the sector.
        assert_eq!(counts.borrow().sectors, 1);
        assert!(world
            .map()
            .sector(SectorId(0))
            .unwrap()
            .floor()
            .surface
            .needs_update);
    }

    #[test]
    fn test_wall_surface_write_notifies_owning_chain() {
        let mut world = two_room_world();
        let counts = Rc::new(RefCell::new(Counts::default()));
        world.set_sink(Some(Box::new(CountingSink(counts.clone()))));

        // Both offset components land in one call; the surface, its side,
        // the owning line and the side's sector each hear it once.
        let id = PropertyId::new(
            Property::OffsetXy,
            modifier::SIDE0_OF_LINE | modifier::MIDDLE_OF_SIDE,
        );
        world
            .setv(
                ElementRef::Line(LineId(0)),
                id,
                &[Value::Double(4.0), Value::Double(8.0)],
            )
            .unwrap();
        assert_eq!(counts.borrow().surfaces, 1);
        assert_eq!(counts.borrow().sides, 1);
        assert_eq!(counts.borrow().lines, 1);
        assert_eq!(counts.borrow().sectors, 1);

        // Five more properties of the same surface, one call each; the
        // owning chain hears every call, never silence.
        for (prop, value) in [
            (Property::OffsetX, Value::Double(1.0)),
            (Property::OffsetY, Value::Double(2.0)),
            (Property::ColorRed, Value::Float(0.5)),
            (Property::Alpha, Value::Float(0.5)),
            (Property::Flags, Value::Int(1)),
        ] {
            world
                .set(
                    ElementRef::Side(SideId(0)),
                    PropertyId::new(prop, modifier::MIDDLE_OF_SIDE),
                    value,
                )
                .unwrap();
        }
        assert_eq!(counts.borrow().surfaces, 6);
        assert_eq!(counts.borrow().sides, 6);
        assert_eq!(counts.borrow().lines, 6);
        assert_eq!(counts.borrow().sectors, 6);
    }

    #[test]
    fn test_redirect_tie_breaks_are_fixed_order() {
        let mut world = two_room_world();
        let sector = ElementRef::Sector(SectorId(0));
        let line = ElementRef::Line(LineId(0));

        // Both plane flags set: the floor wins.
        let both_planes = PropertyId::new(
            Property::Height,
            modifier::FLOOR_OF_SECTOR | modifier::CEILING_OF_SECTOR,
        );
        assert_eq!(
            world.get(sector, both_planes, ValueKind::Double),
            Ok(Value::Double(0.0))
        );

        // Both side flags: side 0 wins. The write lands on side 0's
        // surface and side 1's stays untouched.
        let both_sides = PropertyId::new(
            Property::Alpha,
            modifier::SIDE0_OF_LINE | modifier::SIDE1_OF_LINE | modifier::MIDDLE_OF_SIDE,
        );
        world.set(line, both_sides, Value::Float(0.125)).unwrap();
        assert_eq!(
            world.get(
                line,
                PropertyId::new(Property::Alpha, modifier::SIDE0_OF_LINE | modifier::MIDDLE_OF_SIDE),
                ValueKind::Float
            ),
            Ok(Value::Float(0.125))
        );
        assert_eq!(
            world.get(
                line,
                PropertyId::new(Property::Alpha, modifier::SIDE1_OF_LINE | modifier::MIDDLE_OF_SIDE),
                ValueKind::Float
            ),
            Ok(Value::Float(1.0))
        );

        // Top and bottom both set: top wins.
        let top_and_bottom = PropertyId::new(
            Property::Alpha,
            modifier::SIDE0_OF_LINE | modifier::TOP_OF_SIDE | modifier::BOTTOM_OF_SIDE,
        );
        world.set(line, top_and_bottom, Value::Float(0.25)).unwrap();
        assert_eq!(
            world.get(
                line,
                PropertyId::new(Property::Alpha, modifier::SIDE0_OF_LINE | modifier::TOP_OF_SIDE),
                ValueKind::Float
            ),
            Ok(Value::Float(0.25))
        );
        assert_eq!(
            world.get(
                line,
                PropertyId::new(Property::Alpha, modifier::SIDE0_OF_LINE | modifier::BOTTOM_OF_SIDE),
                ValueKind::Float
            ),
            Ok(Value::Float(1.0))
        );
    }

    #[test]
    fn test_fatal_error_taxonomy() {
        let mut world = two_room_world();
        let vertex = ElementRef::Vertex(VertexId(0));
        let line = ElementRef::Line(LineId(0));

        // Unsupported property.
        assert_eq!(
            world.get(vertex, Property::Height, ValueKind::Double),
            Err(DmuError::UnknownProperty {
                ty: ElementType::Vertex,
                prop: Property::Height
            })
        );
        // Read-only property.
        assert_eq!(
            world.set(line, Property::Length, Value::Double(1.0)),
            Err(DmuError::NotWritable {
                ty: ElementType::Line,
                prop: Property::Length
            })
        );
        // Impossible coercion: angles have no numeric form.
        assert_eq!(
            world.get(line, Property::Angle, ValueKind::Int),
            Err(DmuError::BadCoercion {
                from: ValueKind::Angle,
                to: ValueKind::Int
            })
        );
        // Component-count mismatch on a scalar call.
        assert_eq!(
            world.get(vertex, Property::Xy, ValueKind::Double),
            Err(DmuError::ComponentCount {
                prop: Property::Xy,
                expected: 2,
                got: 1
            })
        );
        // Out-of-range blend mode.
        assert_eq!(
            world.set(
                line,
                PropertyId::new(
                    Property::BlendMode,
                    modifier::SIDE0_OF_LINE | modifier::MIDDLE_OF_SIDE
                ),
                Value::Int(17)
            ),
            Err(DmuError::BadBlendMode(17))
        );
        // Null reference.
        assert_eq!(
            world.get(ElementRef::None, Property::X, ValueKind::Double),
            Err(DmuError::NullRef)
        );
    }

    #[test]
    fn test_dummy_goes_through_the_same_pipeline() {
        let mut world = two_room_world();
        let d = world
            .allocate_dummy(ElementType::Sector, std::ptr::null_mut())
            .unwrap();
        let r = ElementRef::Dummy(d);

        let floor_height = PropertyId::new(Property::Height, modifier::FLOOR_OF_SECTOR);
        world.set(r, floor_height, Value::Fixed(Fixed::from_int(48))).unwrap();
        assert_eq!(
            world.get(r, floor_height, ValueKind::Int),
            Ok(Value::Int(48))
        );
        // Dummies never index as anything but zero.
        assert_eq!(world.index_of(r), Ok(0));
    }

    #[test]
    fn test_blend_mode_round_trip() {
        let mut world = two_room_world();
        let id = PropertyId::new(
            Property::BlendMode,
            modifier::SIDE0_OF_LINE | modifier::TOP_OF_SIDE,
        );
        let line = ElementRef::Line(LineId(0));

        world.set(line, id, Value::Int(2)).unwrap();
        assert_eq!(
            world.get(line, id, ValueKind::BlendMode),
            Ok(Value::BlendMode(BlendMode::Subtract))
        );
        assert_eq!(world.get(line, id, ValueKind::Int), Ok(Value::Int(2)));
    }
}

// src/dmu/dummy.rs
//
// Dummy elements: free-standing stand-ins that carry real element state
// without living in any map. Game code uses them to run line or sector
// math over scratch geometry. A dummy is composed of the real element
// types, so every property a map element answers, its dummy answers the
// same way.
//
// Slots are generation-counted: freeing a dummy invalidates every
// outstanding reference to it, and a recycled slot never answers for a
// stale one.

use std::ffi::c_void;

use generational_arena::{Arena, Index};

use crate::dmu::handle::{ElementType, SectorId, SideSection, PLANE_CEILING, PLANE_FLOOR};
use crate::dmu::property::Property;
use crate::dmu::value::Value;
use crate::errors::DmuError;
use crate::map::line::{Line, LineSide};
use crate::map::sector::Sector;
use crate::map::vertex::Vertex;
use crate::dmu::handle::{ElementRef, LineId, VertexId};

/// Which piece of a dummy a reference addresses. `Whole` is the dummy
/// itself; the rest are produced by property-modifier redirection, the
/// same way a real sector reference redirects to one of its planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyPart {
    Whole,
    /// A plane of a sector dummy.
    Plane(u16),
    /// A side of a line dummy (0 front, 1 back).
    Side(u8),
    /// A wall surface of a line dummy's side.
    SideSurface(u8, SideSection),
    /// A wall surface of a side dummy.
    Surface(SideSection),
}

/// A reference to (part of) an allocated dummy. Cheap to copy; validity
/// is checked against the pool on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyRef {
    pub(crate) slot: Index,
    kind: ElementType,
    pub(crate) part: DummyPart,
}

impl DummyRef {
    /// The element type this reference presents as.
    pub fn type_tag(&self) -> ElementType {
        match self.part {
            DummyPart::Whole => self.kind,
            DummyPart::Plane(_) => ElementType::Plane,
            DummyPart::Side(_) => ElementType::Side,
            DummyPart::SideSurface(..) | DummyPart::Surface(_) => ElementType::Surface,
        }
    }

    /// The type of the dummy allocation itself, ignoring redirection.
    pub fn base_type(&self) -> ElementType {
        self.kind
    }

    pub(crate) fn with_part(self, part: DummyPart) -> DummyRef {
        DummyRef { part, ..self }
    }
}

/// The state a dummy carries, by allocation type. A line dummy owns both
/// of its sides so side redirection works without a map.
#[derive(Debug)]
enum DummyBody {
    Vertex(Vertex),
    Line { line: Line, sides: [LineSide; 2] },
    Sector(Sector),
    Side(LineSide),
}

#[derive(Debug)]
struct DummySlot {
    body: DummyBody,
    /// Caller-owned payload, carried but never dereferenced here.
    extra: *mut c_void,
}

/// The allocation pool for dummies. Owned by the `World`; there is no
/// global pool.
#[derive(Debug)]
pub struct DummyPool {
    arena: Arena<DummySlot>,
}

impl Default for DummyPool {
    fn default() -> Self {
        DummyPool::new()
    }
}

impl DummyPool {
    pub fn new() -> Self {
        DummyPool {
            arena: Arena::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Allocates a fresh dummy of the given type. Only the types whose
    /// state stands alone can be dummies.
    pub fn allocate(&mut self, ty: ElementType, extra: *mut c_void) -> Result<DummyRef, DmuError> {
        let body = match ty {
            ElementType::Vertex => DummyBody::Vertex(Vertex::new(0.0, 0.0)),
            ElementType::Line => DummyBody::Line {
                line: Line::new(VertexId(0), VertexId(0)),
                sides: [
                    LineSide::new(LineId(0), None),
                    LineSide::new(LineId(0), None),
                ],
            },
            ElementType::Sector => DummyBody::Sector(Sector::new(0.0, 0.0, 1.0)),
            ElementType::Side => DummyBody::Side(LineSide::new(LineId(0), None)),
            other => return Err(DmuError::BadDummyType(other)),
        };
        let slot = self.arena.insert(DummySlot { body, extra });
        Ok(DummyRef {
            slot,
            kind: ty,
            part: DummyPart::Whole,
        })
    }

    /// Frees a dummy and hands its extra-data pointer back to the caller,
    /// who owns whatever it points at.
    pub fn free(&mut self, r: DummyRef) -> Result<*mut c_void, DmuError> {
        self.arena
            .remove(r.slot)
            .map(|slot| slot.extra)
            .ok_or(DmuError::NotADummy)
    }

    pub fn contains(&self, r: DummyRef) -> bool {
        self.arena.contains(r.slot)
    }

    pub fn extra_data(&self, r: DummyRef) -> Result<*mut c_void, DmuError> {
        self.slot(r).map(|s| s.extra)
    }

    /// The type a reference currently answers as, or `None` if it has
    /// been freed.
    pub fn type_of(&self, r: DummyRef) -> Option<ElementType> {
        self.arena.contains(r.slot).then(|| r.type_tag())
    }

    fn slot(&self, r: DummyRef) -> Result<&DummySlot, DmuError> {
        self.arena.get(r.slot).ok_or(DmuError::NotADummy)
    }

    fn slot_mut(&mut self, r: DummyRef) -> Result<&mut DummySlot, DmuError> {
        self.arena.get_mut(r.slot).ok_or(DmuError::NotADummy)
    }

    pub(crate) fn read_property(
        &self,
        r: DummyRef,
        prop: Property,
    ) -> Result<Vec<Value>, DmuError> {
        let slot = self.slot(r)?;
        match (&slot.body, r.part) {
            (DummyBody::Vertex(v), DummyPart::Whole) => v.property(prop),
            (DummyBody::Line { line, .. }, DummyPart::Whole) => match prop {
                // A dummy line's sides are its own parts, not map sides.
                Property::Front => Ok(vec![Value::Element(ElementRef::Dummy(
                    r.with_part(DummyPart::Side(0)),
                ))]),
                Property::Back => Ok(vec![Value::Element(ElementRef::Dummy(
                    r.with_part(DummyPart::Side(1)),
                ))]),
                _ => line.property(prop),
            },
            (DummyBody::Line { sides, .. }, DummyPart::Side(i)) => sides[i as usize & 1]
                .property(prop),
            (DummyBody::Line { sides, .. }, DummyPart::SideSurface(i, section)) => {
                sides[i as usize & 1].surface(section).property(prop)
            }
            (DummyBody::Sector(s), DummyPart::Whole) => match prop {
                Property::FloorPlane => Ok(vec![Value::Element(ElementRef::Dummy(
                    r.with_part(DummyPart::Plane(PLANE_FLOOR)),
                ))]),
                Property::CeilingPlane => Ok(vec![Value::Element(ElementRef::Dummy(
                    r.with_part(DummyPart::Plane(PLANE_CEILING)),
                ))]),
                // The sector id only feeds the plane refs handled above.
                _ => s.property(SectorId(0), prop),
            },
            (DummyBody::Sector(s), DummyPart::Plane(i)) => s.plane(i)?.property(prop),
            (DummyBody::Side(side), DummyPart::Whole) => side.property(prop),
            (DummyBody::Side(side), DummyPart::Surface(section)) => {
                side.surface(section).property(prop)
            }
            _ => Err(DmuError::InvalidType(r.type_tag())),
        }
    }

    pub(crate) fn write_property(
        &mut self,
        r: DummyRef,
        prop: Property,
        vals: &[Value],
    ) -> Result<bool, DmuError> {
        let slot = self.slot_mut(r)?;
        match (&mut slot.body, r.part) {
            (DummyBody::Vertex(v), DummyPart::Whole) => v.set_property(prop, vals),
            (DummyBody::Line { line, .. }, DummyPart::Whole) => line.set_property(prop, vals),
            (DummyBody::Line { sides, .. }, DummyPart::Side(i)) => {
                sides[i as usize & 1].set_property(prop, vals)
            }
            (DummyBody::Line { sides, .. }, DummyPart::SideSurface(i, section)) => sides
                [i as usize & 1]
                .surface_mut(section)
                .set_property(prop, vals),
            (DummyBody::Sector(s), DummyPart::Whole) => s.set_property(SectorId(0), prop, vals),
            (DummyBody::Sector(s), DummyPart::Plane(i)) => s.plane_mut(i)?.set_property(prop, vals),
            (DummyBody::Side(side), DummyPart::Whole) => side.set_property(prop, vals),
            (DummyBody::Side(side), DummyPart::Surface(section)) => {
                side.surface_mut(section).set_property(prop, vals)
            }
            _ => Err(DmuError::InvalidType(r.type_tag())),
        }
    }
}

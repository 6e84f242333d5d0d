// src/dmu/handle.rs
//
// Typed element ids and the tagged element reference that replaces the
// old void*-based handle protocol. The type tag travels with the
// reference, so recovering the concrete element is an exhaustive match
// instead of a blind cast.

use crate::dmu::dummy::DummyRef;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_type!(/// Index of a vertex in its map's storage.
    VertexId);
id_type!(/// Index of a line in its map's storage.
    LineId);
id_type!(/// Index of a line side in its map's storage.
    SideId);
id_type!(/// Index of a sector in its map's storage.
    SectorId);
id_type!(/// Index of an internal BSP node.
    NodeId);
id_type!(/// Index of a BSP leaf.
    LeafId);
id_type!(/// Index of a material in the material bank.
    MaterialId);

impl MaterialId {
    /// The "missing" placeholder every bank carries in slot 0.
    pub const MISSING: MaterialId = MaterialId(0);
}

/// A plane is only addressable through its owning sector; index 0 is the
/// floor, 1 the ceiling, anything above is an extra plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaneId {
    pub sector: SectorId,
    pub plane: u16,
}

pub const PLANE_FLOOR: u16 = 0;
pub const PLANE_CEILING: u16 = 1;

/// Which of a side's three wall slots a surface occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SideSection {
    Top,
    Middle,
    Bottom,
}

/// A surface is owned either by a plane or by one section of a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceId {
    Plane(PlaneId),
    Side(SideId, SideSection),
}

/// The closed set of element type tags exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    None,
    Vertex,
    Line,
    Side,
    Sector,
    Plane,
    Surface,
    BspNode,
    BspLeaf,
    Material,
}

/// An opaque handle to a map element (or a dummy standing in for one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef {
    None,
    Vertex(VertexId),
    Line(LineId),
    Side(SideId),
    Sector(SectorId),
    Plane(PlaneId),
    Surface(SurfaceId),
    BspNode(NodeId),
    BspLeaf(LeafId),
    Material(MaterialId),
    Dummy(DummyRef),
}

impl ElementRef {
    /// The type tag embedded in the reference itself. For dummies this is
    /// the tag of the element the dummy imitates; whether the dummy is
    /// still allocated is the pool's business (see `World::type_of`).
    pub fn embedded_type(&self) -> ElementType {
        match self {
            ElementRef::None => ElementType::None,
            ElementRef::Vertex(_) => ElementType::Vertex,
            ElementRef::Line(_) => ElementType::Line,
            ElementRef::Side(_) => ElementType::Side,
            ElementRef::Sector(_) => ElementType::Sector,
            ElementRef::Plane(_) => ElementType::Plane,
            ElementRef::Surface(_) => ElementType::Surface,
            ElementRef::BspNode(_) => ElementType::BspNode,
            ElementRef::BspLeaf(_) => ElementType::BspLeaf,
            ElementRef::Material(_) => ElementType::Material,
            ElementRef::Dummy(d) => d.type_tag(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ElementRef::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_types() {
        assert_eq!(ElementRef::None.embedded_type(), ElementType::None);
        assert_eq!(
            ElementRef::Vertex(VertexId(3)).embedded_type(),
            ElementType::Vertex
        );
        assert_eq!(
            ElementRef::Plane(PlaneId {
                sector: SectorId(0),
                plane: PLANE_CEILING
            })
            .embedded_type(),
            ElementType::Plane
        );
        assert_eq!(
            ElementRef::Surface(SurfaceId::Side(SideId(1), SideSection::Top)).embedded_type(),
            ElementType::Surface
        );
    }
}

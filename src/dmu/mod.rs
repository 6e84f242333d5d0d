// src/dmu/mod.rs
//
// The map-update accessor protocol: typed handles, the flat property-id
// namespace, value coercion, the dummy pool, and the dispatch pipeline
// (implemented as inherent methods on `World`).

pub mod dispatch;
pub mod dummy;
pub mod handle;
pub mod property;
pub mod value;

pub use dummy::{DummyPool, DummyRef};
pub use handle::{
    ElementRef, ElementType, LeafId, LineId, MaterialId, NodeId, PlaneId, SectorId, SideId,
    SideSection, SurfaceId, VertexId, PLANE_CEILING, PLANE_FLOOR,
};
pub use property::{modifier, Property, PropertyId};
pub use value::{BlendMode, Value, ValueKind};

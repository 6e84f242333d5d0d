// src/lib.rs
//
// dmu_map: the runtime map data model of a classic-FPS engine, the
// generic map-update (DMU) accessor protocol over it, and the BSP
// line-of-sight tracer.
//
// A `World` owns one `Map` plus the material bank and dummy pool; all
// property access funnels through the `World` accessors, which apply
// modifier redirection, value coercion and change notification. Maps are
// built either directly (editing-phase `add_*` calls) or from classic
// lump records via `convert`.

pub mod bsp;
pub mod convert;
pub mod dmu;
pub mod errors;
pub mod fixed;
pub mod map;
pub mod utils;
pub mod world;

pub use bsp::{
    check_sight, BspChild, BspLeaf, BspNode, BspTree, HEdge, Partition, PASS_OVER, PASS_UNDER,
};
pub use dmu::{
    modifier, BlendMode, DummyRef, ElementRef, ElementType, LeafId, LineId, MaterialId, NodeId,
    PlaneId, Property, PropertyId, SectorId, SideId, SideSection, SurfaceId, Value, ValueKind,
    VertexId,
};
pub use errors::DmuError;
pub use fixed::{Angle, Fixed};
pub use map::{Map, Material, MaterialBank};
pub use world::{Relation, ThinkerSource, UpdateSink, World};

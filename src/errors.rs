// src/errors.rs

use thiserror::Error;

use crate::dmu::handle::ElementType;
use crate::dmu::property::Property;
use crate::dmu::value::ValueKind;

/// Errors raised by the map-update (DMU) layer.
///
/// Everything here is the fail-fast kind: a bad element type, a property an
/// element does not support, an impossible value coercion. These indicate a
/// bug in calling code, so they are returned as `Err` rather than being
/// swallowed; callers must not treat them as "did nothing".
#[derive(Debug, Error, PartialEq)]
pub enum DmuError {
    #[error("element type {0:?} cannot be used here")]
    InvalidType(ElementType),

    #[error("property {prop:?} is not supported by {ty:?}")]
    UnknownProperty { ty: ElementType, prop: Property },

    #[error("property {prop:?} of {ty:?} is read-only")]
    NotWritable { ty: ElementType, prop: Property },

    #[error("cannot coerce {from:?} value to {to:?}")]
    BadCoercion { from: ValueKind, to: ValueKind },

    #[error("modifier flags {modifiers:#010x} do not apply to {ty:?}")]
    BadRedirect { ty: ElementType, modifiers: u32 },

    #[error("{ty:?} index {index} out of range (have {count})")]
    IndexOutOfRange {
        ty: ElementType,
        index: usize,
        count: usize,
    },

    #[error("a plane cannot be addressed by bare index; it is only reachable through its sector")]
    AmbiguousPlaneIndex,

    #[error("{0:?} elements cannot be addressed by bare index")]
    UnaddressableIndex(ElementType),

    #[error("blend mode {0} is out of range")]
    BadBlendMode(i32),

    #[error("property {prop:?} has {expected} component(s), got {got}")]
    ComponentCount {
        prop: Property,
        expected: usize,
        got: usize,
    },

    #[error("null element reference")]
    NullRef,

    #[error("reference is not a currently allocated dummy")]
    NotADummy,

    #[error("dummies of type {0:?} cannot be allocated")]
    BadDummyType(ElementType),

    #[error("map has no BSP tree attached")]
    NoBspTree,

    #[error("sight trace exceeded its step budget ({steps} steps); BSP tree is corrupt")]
    TraceBudgetExceeded { steps: u32 },
}
